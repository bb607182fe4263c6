#![forbid(unsafe_code)]

pub mod app;
pub mod catalog;
pub mod cli;
pub mod logging;
pub mod model;
pub mod render;
pub mod session;
