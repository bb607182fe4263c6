use std::sync::{Arc, Mutex};

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::catalog::CatalogClient;
use crate::model::SavedBook;
use crate::render;
use crate::session::{Notice, ScanUpload, Session, SessionRegistry};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

const SESSION_COOKIE: &str = "sid";

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionRegistry,
    pub catalog: Arc<dyn CatalogClient>,
    pub max_upload_bytes: usize,
}

pub fn router(state: AppState) -> Router {
    let max_upload_bytes = state.max_upload_bytes;
    Router::new()
        .route("/", get(|| async { Redirect::to("/search") }))
        .route("/healthz", get(|| async { "ok\n" }))
        .route("/search", get(search_page).post(run_search))
        .route("/search/save/:index", post(save_result))
        .route("/saved", get(saved_page))
        .route("/saved/remove/:index", post(remove_saved))
        .route("/scan", get(scan_page).post(upload_cover))
        .route("/scan/cover", get(scan_cover))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// A visitor's session for the current request, plus whether the `sid` cookie
/// still has to be issued on the response.
struct SessionHandle {
    id: Uuid,
    issued: bool,
    session: Arc<Mutex<Session>>,
}

fn session_handle(state: &AppState, headers: &HeaderMap) -> SessionHandle {
    let (id, issued) = match cookie_session_id(headers) {
        Some(id) => (id, false),
        None => (Uuid::new_v4(), true),
    };
    SessionHandle {
        id,
        issued,
        session: state.sessions.get_or_create(id),
    }
}

fn cookie_session_id(headers: &HeaderMap) -> Option<Uuid> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name != SESSION_COOKIE {
            return None;
        }
        Uuid::parse_str(value.trim()).ok()
    })
}

fn with_session_cookie(handle: &SessionHandle, mut response: Response) -> Response {
    if !handle.issued {
        return response;
    }
    let cookie = format!(
        "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
        handle.id
    );
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
        Err(err) => tracing::error!(error = %err, "session cookie is not a valid header value"),
    }
    response
}

fn lock(session: &Arc<Mutex<Session>>) -> std::sync::MutexGuard<'_, Session> {
    session.lock().expect("session lock poisoned")
}

async fn search_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let handle = session_handle(&state, &headers);
    // One snapshot per render: clone under the lock, render after dropping it.
    let (search, notice) = {
        let mut session = lock(&handle.session);
        (session.search.clone(), session.take_notice())
    };

    let html = render::search_page(
        &search.query,
        search.searched,
        &search.results,
        notice.as_ref(),
    );
    with_session_cookie(&handle, Html(html).into_response())
}

#[derive(Debug, Deserialize)]
struct SearchForm {
    #[serde(default)]
    query: String,
}

async fn run_search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<SearchForm>,
) -> Response {
    let handle = session_handle(&state, &headers);
    let query = form.query.trim().to_string();

    if query.is_empty() {
        lock(&handle.session).set_notice(Notice::Error(
            "Please enter a topic before searching.".to_string(),
        ));
        return with_session_cookie(&handle, Redirect::to("/search").into_response());
    }

    // The catalog call happens outside the session lock; the lock must never
    // be held across an await.
    let results = state.catalog.search(&query).await;
    tracing::info!(query, results = results.len(), "search finished");

    {
        let mut session = lock(&handle.session);
        session.search.query = query;
        session.search.results = results;
        session.search.searched = true;
    }
    with_session_cookie(&handle, Redirect::to("/search").into_response())
}

async fn save_result(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    headers: HeaderMap,
) -> Response {
    let handle = session_handle(&state, &headers);
    {
        let mut session = lock(&handle.session);
        match session.search.results.get(index) {
            Some(record) => {
                let book = SavedBook::from_record(record);
                let title = book.title.clone();
                session.save(book);
                session.set_notice(Notice::Success(format!("'{title}' saved!")));
            }
            None => {
                tracing::warn!(
                    index,
                    results = session.search.results.len(),
                    "save index out of range, ignoring"
                );
                session.set_notice(Notice::Error(
                    "That result is no longer on screen.".to_string(),
                ));
            }
        }
    }
    with_session_cookie(&handle, Redirect::to("/search").into_response())
}

async fn saved_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let handle = session_handle(&state, &headers);
    let (books, notice) = {
        let mut session = lock(&handle.session);
        (session.saved(), session.take_notice())
    };

    let html = render::saved_page(&books, notice.as_ref());
    with_session_cookie(&handle, Html(html).into_response())
}

async fn remove_saved(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    headers: HeaderMap,
) -> Response {
    let handle = session_handle(&state, &headers);
    lock(&handle.session).remove_at(index);
    with_session_cookie(&handle, Redirect::to("/saved").into_response())
}

async fn scan_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let handle = session_handle(&state, &headers);
    let (file_name, notice) = {
        let mut session = lock(&handle.session);
        (
            session.scan.as_ref().map(|upload| upload.file_name.clone()),
            session.take_notice(),
        )
    };

    let html = render::scan_page(file_name.as_deref(), notice.as_ref());
    with_session_cookie(&handle, Html(html).into_response())
}

async fn upload_cover(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let handle = session_handle(&state, &headers);
    let outcome = read_cover_field(multipart, state.max_upload_bytes).await;

    {
        let mut session = lock(&handle.session);
        match outcome {
            Ok(upload) => {
                tracing::info!(
                    file = upload.file_name,
                    bytes = upload.bytes.len(),
                    "cover uploaded"
                );
                session.scan = Some(upload);
                session.set_notice(Notice::Info("Cover uploaded.".to_string()));
            }
            Err(message) => session.set_notice(Notice::Error(message)),
        }
    }
    with_session_cookie(&handle, Redirect::to("/scan").into_response())
}

async fn read_cover_field(
    mut multipart: Multipart,
    max_upload_bytes: usize,
) -> Result<ScanUpload, String> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| format!("Upload failed: {err}"))?
    {
        if field.name() != Some("cover") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("cover").to_string();
        let Some(content_type) = image_content_type(&file_name) else {
            return Err("Only jpg, jpeg and png covers are supported.".to_string());
        };

        let bytes = field
            .bytes()
            .await
            .map_err(|err| format!("Upload failed: {err}"))?;
        if bytes.is_empty() {
            return Err("The uploaded file is empty.".to_string());
        }
        if bytes.len() > max_upload_bytes {
            return Err(format!(
                "Cover image exceeds the {max_upload_bytes} byte limit."
            ));
        }

        return Ok(ScanUpload {
            file_name,
            content_type: content_type.to_string(),
            bytes: bytes.to_vec(),
        });
    }

    Err("Choose a cover image to upload.".to_string())
}

fn image_content_type(file_name: &str) -> Option<&'static str> {
    let ext = std::path::Path::new(file_name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        _ => None,
    }
}

async fn scan_cover(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let handle = session_handle(&state, &headers);
    let upload = lock(&handle.session).scan.clone();

    let response = match upload {
        Some(upload) => {
            let content_type = HeaderValue::from_str(&upload.content_type)
                .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
            ([(header::CONTENT_TYPE, content_type)], upload.bytes).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    };
    with_session_cookie(&handle, response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_header_parsing_finds_the_session_id() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; sid={id}; lang=en")).unwrap(),
        );
        assert_eq!(cookie_session_id(&headers), Some(id));
    }

    #[test]
    fn malformed_or_missing_cookie_yields_none() {
        assert_eq!(cookie_session_id(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("sid=not-a-uuid"));
        assert_eq!(cookie_session_id(&headers), None);
    }

    #[test]
    fn upload_types_are_restricted_to_images() {
        assert_eq!(image_content_type("cover.png"), Some("image/png"));
        assert_eq!(image_content_type("cover.JPG"), Some("image/jpeg"));
        assert_eq!(image_content_type("cover.jpeg"), Some("image/jpeg"));
        assert_eq!(image_content_type("cover.gif"), None);
        assert_eq!(image_content_type("cover"), None);
    }
}
