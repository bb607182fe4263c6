use std::net::SocketAddr;

use clap::Parser;

use crate::app::DEFAULT_MAX_UPLOAD_BYTES;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Address to serve the app on.
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub addr: SocketAddr,

    /// Maximum accepted cover upload size in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,
}
