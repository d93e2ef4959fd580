// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Local HTTP server streaming recordings from the log directory.
//!
//! `GET /video/{filename}` serves a file from the configured root with
//! support for single byte ranges, which video decoders use to seek
//! without downloading the whole file.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::watch;
use tokio_util::io::ReaderStream;
use tower_http::cors::{Any, CorsLayer};

/// Port the server listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 3001;

/// Interpretation of a `Range` header against a file of known size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRequest {
    /// No usable range; send the whole file.
    Whole,
    /// Inclusive byte range.
    Bytes { start: u64, end: u64 },
    /// The range lies outside the file.
    Unsatisfiable,
}

impl RangeRequest {
    pub fn len(&self) -> u64 {
        match self {
            RangeRequest::Bytes { start, end } => end - start + 1,
            _ => 0,
        }
    }
}

/// Parse `bytes=start-end`, `bytes=start-` or `bytes=-suffix`.
///
/// Malformed headers and multi-range requests fall back to the whole file.
pub fn parse_range(header: Option<&str>, size: u64) -> RangeRequest {
    let Some(spec) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeRequest::Whole;
    };
    if spec.contains(',') {
        return RangeRequest::Whole;
    }
    let Some((start, end)) = spec.split_once('-') else {
        return RangeRequest::Whole;
    };
    let (start, end) = (start.trim(), end.trim());

    if start.is_empty() {
        let Ok(suffix) = end.parse::<u64>() else {
            return RangeRequest::Whole;
        };
        if suffix == 0 || size == 0 {
            return RangeRequest::Unsatisfiable;
        }
        return RangeRequest::Bytes {
            start: size.saturating_sub(suffix),
            end: size - 1,
        };
    }

    let Ok(start) = start.parse::<u64>() else {
        return RangeRequest::Whole;
    };
    let end = if end.is_empty() {
        size.saturating_sub(1)
    } else {
        match end.parse::<u64>() {
            Ok(end) if end >= start => end.min(size.saturating_sub(1)),
            Ok(_) => return RangeRequest::Unsatisfiable,
            Err(_) => return RangeRequest::Whole,
        }
    };

    if start >= size {
        return RangeRequest::Unsatisfiable;
    }
    RangeRequest::Bytes { start, end }
}

#[derive(Clone)]
struct ServerState {
    root: Arc<PathBuf>,
}

/// Build the router serving files below `root`.
pub fn router(root: PathBuf) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([header::RANGE])
        .expose_headers([
            header::ACCEPT_RANGES,
            header::CONTENT_ENCODING,
            header::CONTENT_LENGTH,
            header::CONTENT_RANGE,
        ]);

    Router::new()
        .route("/video/{filename}", get(serve_video))
        .layer(cors)
        .with_state(ServerState {
            root: Arc::new(root),
        })
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(|c: char| c == '/' || c == '\\')
}

async fn serve_video(
    State(state): State<ServerState>,
    Path(filename): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !is_plain_file_name(&filename) {
        log::warn!("Rejected video request for {:?}", filename);
        return StatusCode::NOT_FOUND.into_response();
    }
    let path = state.root.join(&filename);

    let size = match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => meta.len(),
        _ => {
            log::debug!("Video not found: {}", path.display());
            return StatusCode::NOT_FOUND.into_response();
        }
    };
    let content_type = mime_guess::from_path(&path)
        .first_or_octet_stream()
        .to_string();

    let range = parse_range(
        headers.get(header::RANGE).and_then(|v| v.to_str().ok()),
        size,
    );

    let mut file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) => {
            log::error!("Failed to open {}: {}", path.display(), e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match range {
        RangeRequest::Whole => (
            StatusCode::OK,
            [
                (header::ACCEPT_RANGES, "bytes".to_string()),
                (header::CONTENT_LENGTH, size.to_string()),
                (header::CONTENT_TYPE, content_type),
            ],
            Body::from_stream(ReaderStream::new(file)),
        )
            .into_response(),
        RangeRequest::Bytes { start, end } => {
            if let Err(e) = file.seek(std::io::SeekFrom::Start(start)).await {
                log::error!("Failed to seek {}: {}", path.display(), e);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
            let length = range.len();
            (
                StatusCode::PARTIAL_CONTENT,
                [
                    (header::CONTENT_RANGE, format!("bytes {}-{}/{}", start, end, size)),
                    (header::ACCEPT_RANGES, "bytes".to_string()),
                    (header::CONTENT_LENGTH, length.to_string()),
                    (header::CONTENT_TYPE, content_type),
                ],
                Body::from_stream(ReaderStream::new(file.take(length))),
            )
                .into_response()
        }
        RangeRequest::Unsatisfiable => (
            StatusCode::RANGE_NOT_SATISFIABLE,
            [(header::CONTENT_RANGE, format!("bytes */{}", size))],
        )
            .into_response(),
    }
}

/// Running server. Dropping the handle asks it to stop.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    thread: Option<JoinHandle<()>>,
}

impl ServerHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// URL under which `filename` is served, with the name percent-encoded.
    pub fn video_url(&self, filename: &str) -> String {
        let base = format!("http://{}/video/", self.addr);
        let Ok(mut url) = reqwest::Url::parse(&base) else {
            return base + filename;
        };
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(filename);
        }
        url.into()
    }

    /// Stop the server and wait for its thread to exit.
    pub fn stop(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

/// Serve `root` on `127.0.0.1:port` from a dedicated thread.
///
/// Port 0 picks a free port; the bound address is available from the handle.
pub fn spawn(root: PathBuf, port: u16) -> anyhow::Result<ServerHandle> {
    let listener = std::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], port)))?;
    listener.set_nonblocking(true)?;
    let addr = listener.local_addr()?;
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;

    let app = router(root.clone());
    let thread = std::thread::Builder::new()
        .name("video-server".to_string())
        .spawn(move || {
            runtime.block_on(async move {
                let listener = match tokio::net::TcpListener::from_std(listener) {
                    Ok(listener) => listener,
                    Err(e) => {
                        log::error!("Video server failed to start: {}", e);
                        return;
                    }
                };
                let served = axum::serve(listener, app)
                    .with_graceful_shutdown(async move {
                        loop {
                            if *shutdown_rx.borrow() {
                                break;
                            }
                            if shutdown_rx.changed().await.is_err() {
                                break;
                            }
                        }
                    })
                    .await;
                if let Err(e) = served {
                    log::error!("Video server error: {}", e);
                }
                log::info!("Video server stopped");
            });
        })?;

    log::info!("Serving {} on http://{}", root.display(), addr);
    Ok(ServerHandle {
        addr,
        shutdown,
        thread: Some(thread),
    })
}
