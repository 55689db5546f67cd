use std::sync::Arc;

use serde::Deserialize;

use fetchgate_core::error::GatewayError;
use fetchgate_core::event::{ProgressEvent, Status};
use fetchgate_core::{download, vcs};

use crate::registry::{Outbound, Outbox};
use crate::server::AppState;

// ---------------------------------------------------------------------------
// Request parsing
// ---------------------------------------------------------------------------

/// A fully validated inbound request. Invalid or incomplete input never
/// produces one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Check { token: String },
    Download { url: String },
    Clone { url: String },
}

/// The raw wire shape before validation. Every field is optional so the
/// missing-field checks happen here, in one place, instead of as late
/// surprises in the handlers.
#[derive(Deserialize)]
struct RawRequest {
    request: Option<String>,
    url: Option<String>,
    token: Option<String>,
}

/// Single validating parse from raw text to a [`Request`].
pub fn parse_request(text: &str) -> Result<Request, GatewayError> {
    let raw: RawRequest = serde_json::from_str(text)?;
    let kind = raw.request.ok_or(GatewayError::MissingField("request"))?;
    match kind.as_str() {
        "check" => {
            let token = raw.token.ok_or(GatewayError::MissingField("token"))?;
            Ok(Request::Check { token })
        }
        "download" => {
            let url = raw.url.ok_or(GatewayError::MissingField("url"))?;
            Ok(Request::Download { url })
        }
        "clone" => {
            let url = raw.url.ok_or(GatewayError::MissingField("url"))?;
            Ok(Request::Clone { url })
        }
        other => Err(GatewayError::UnsupportedRequest(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Handle one inbound message on behalf of a session.
///
/// Emits `parsing` on receipt, parses, and routes. Check runs inline;
/// download and clone are spawned off the receive path with their events
/// marshaled back through the session's outbox, so the caller is free to
/// keep reading the socket while the work runs. Every failure becomes one
/// `error` event with fixed user-facing text, the raw detail goes to the
/// log, and the session stays usable for the next message.
pub async fn handle_message(state: Arc<AppState>, outbox: Outbox, text: String) {
    send_event(&outbox, ProgressEvent::status_only(Status::Parsing));

    let request = match parse_request(&text) {
        Ok(request) => request,
        Err(e) => {
            log::warn!("[dispatch] rejected message: {}", e);
            send_error(&outbox, &e);
            return;
        }
    };

    match request {
        Request::Check { token } => handle_check(&state, &outbox, &token).await,
        Request::Download { url } => spawn_download(state, outbox, url),
        Request::Clone { url } => spawn_clone(state, outbox, url),
    }
}

async fn handle_check(state: &AppState, outbox: &Outbox, token: &str) {
    match state.verifier.verify(token).await {
        Ok(true) => send_event(outbox, ProgressEvent::new(Status::Checking, "success")),
        Ok(false) => {
            let e = GatewayError::Internal("challenge token rejected".to_string());
            log::warn!("[dispatch] {}", e);
            send_error(outbox, &e);
        }
        Err(e) => {
            log::error!("[dispatch] challenge verification failed: {}", e);
            send_error(outbox, &e);
        }
    }
}

fn spawn_download(state: Arc<AppState>, outbox: Outbox, url: String) {
    send_event(&outbox, ProgressEvent::percent(Status::Downloading, 0));
    tokio::spawn(async move {
        let ticker = outbox.clone();
        let result = download::download(&state.http, &url, &state.config.archive_dir, |pct| {
            send_event(&ticker, ProgressEvent::percent(Status::Downloading, pct));
        })
        .await;

        match result {
            Ok(file_name) => {
                send_event(&outbox, ProgressEvent::new(Status::Completed, file_name));
            }
            Err(e) => {
                log::error!("[dispatch] download of \"{}\" failed: {}", url, e);
                send_error(&outbox, &e);
            }
        }
    });
}

fn spawn_clone(state: Arc<AppState>, outbox: Outbox, url: String) {
    send_event(&outbox, ProgressEvent::percent(Status::CheckingOut, 0));
    tokio::spawn(async move {
        let ticker = outbox.clone();
        let result = vcs::pipeline::clone_and_archive(
            state.engine.as_ref(),
            &url,
            &state.config.repo_dir,
            &state.config.archive_dir,
            |pct| {
                send_event(&ticker, ProgressEvent::percent(Status::CheckingOut, pct));
            },
        )
        .await;

        match result {
            Ok(archive_name) => {
                send_event(&outbox, ProgressEvent::new(Status::Completed, archive_name));
            }
            Err(e) => {
                log::error!("[dispatch] clone of \"{}\" failed: {}", url, e);
                send_error(&outbox, &e);
            }
        }
    });
}

/// Push one event onto the session's send path. A closed outbox means the
/// client is gone; the event is discarded without fuss.
fn send_event(outbox: &Outbox, event: ProgressEvent) {
    if outbox.send(Outbound::Event(event)).is_err() {
        log::debug!("[dispatch] session gone, event dropped");
    }
}

fn send_error(outbox: &Outbox, error: &GatewayError) {
    send_event(outbox, ProgressEvent::new(Status::Error, error.user_text()));
}
