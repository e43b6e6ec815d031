//! HTTP serving glue: routes client requests onto directory and stream
//! lookups and emits playlist text and segment bytes.
//!
//! The router is scoped to the server instance. Mountpoint paths are
//! dispatched from the fallback handler so `/{mount}/`,
//! `/{mount}/playlist.m3u8`, `/{mount}/chunklist.m3u8`, and
//! `/{mount}/{n}.ts` all resolve against the directory, and everything
//! else hits the configured redirect (or a 404).

use crate::format::hls;
use crate::stream::Directory;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderName, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::set_header::SetResponseHeaderLayer;

/// HLS playlist content type.
const CONTENT_TYPE_M3U8: &str = "application/vnd.apple.mpegurl";
/// Transport stream segment content type.
const CONTENT_TYPE_TS: &str = "video/MP2T";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Stream registry the handlers read from.
    pub directory: Arc<Directory>,
    /// Redirect target for unmatched paths.
    pub redirect: Option<String>,
    /// Minimum serviceable streams for `/healthy` to pass.
    pub min_streams: usize,
}

/// Builds the router with the `Server` header applied to every response.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/healthy", get(healthy))
        .fallback(dispatch)
        .layer(SetResponseHeaderLayer::overriding(
            header::SERVER,
            HeaderValue::from_static("Anarcast"),
        ))
        .with_state(state)
}

async fn root(State(state): State<AppState>) -> Response {
    match &state.redirect {
        Some(url) => Redirect::to(url).into_response(),
        None => "Hello, World!\n".into_response(),
    }
}

async fn healthy(State(state): State<AppState>) -> Response {
    if state.directory.list().len() >= state.min_streams {
        StatusCode::OK.into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

/// Resolves `/{mount}/...` paths; anything that does not match a stream
/// resource falls through to the redirect/404 default.
async fn dispatch(State(state): State<AppState>, uri: Uri) -> Response {
    let Some((mount, resource)) = split_mount_path(uri.path()) else {
        return miss(&state);
    };

    match resource {
        "" | "playlist.m3u8" => match state.directory.find(mount) {
            Some(_) => playlist_response(hls::master_playlist()),
            None => StatusCode::NOT_FOUND.into_response(),
        },
        "chunklist.m3u8" => {
            let Some(stream) = state.directory.find(mount) else {
                return StatusCode::NOT_FOUND.into_response();
            };
            let entries = stream.index();
            if entries.is_empty() {
                return StatusCode::NOT_FOUND.into_response();
            }
            with_cors(playlist_response(hls::media_playlist(&entries)))
        }
        _ => match segment_number(resource) {
            Some(index) => {
                let chunk = state.directory.find(mount).and_then(|s| s.chunk(index));
                match chunk {
                    Some(data) => with_cors(
                        ([(header::CONTENT_TYPE, CONTENT_TYPE_TS)], Body::from(data))
                            .into_response(),
                    ),
                    None => StatusCode::NOT_FOUND.into_response(),
                }
            }
            None => miss(&state),
        },
    }
}

/// Splits a request path into `(mount, resource)` when the mount name is
/// well-formed and the remainder has no further slashes.
fn split_mount_path(path: &str) -> Option<(&str, &str)> {
    let (mount, resource) = path.strip_prefix('/')?.split_once('/')?;
    if !valid_mount(mount) || resource.contains('/') {
        return None;
    }
    Some((mount, resource))
}

fn valid_mount(mount: &str) -> bool {
    !mount.is_empty()
        && mount
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_'))
}

fn segment_number(resource: &str) -> Option<u64> {
    resource.strip_suffix(".ts")?.parse().ok()
}

fn miss(state: &AppState) -> Response {
    match &state.redirect {
        Some(url) => Redirect::to(url).into_response(),
        None => (StatusCode::NOT_FOUND, "Sorry\n").into_response(),
    }
}

fn playlist_response(body: String) -> Response {
    ([(header::CONTENT_TYPE, CONTENT_TYPE_M3U8)], body).into_response()
}

/// CORS and caching headers set on chunk list and segment responses.
fn with_cors(mut response: Response) -> Response {
    const HEADERS: [(&str, &str); 6] = [
        ("access-control-allow-origin", "*"),
        ("allow-credentials", "true"),
        ("allow-methods", "OPTIONS, GET, POST, HEAD"),
        (
            "allow-headers",
            "Content-Type, User-Agent, If-Modified-Since, Cache-Control, Range",
        ),
        (
            "expose-headers",
            "Date, Server, Content-Type, Content-Length",
        ),
        ("cache-control", "no-cache"),
    ];

    let headers = response.headers_mut();
    for (name, value) in HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    response
}
