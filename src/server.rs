//! The HTTP face of the reader: one endpoint, one JSON envelope.
//!
//! `GET /api/read` runs a full card transaction and answers with
//! `{code, message, data?}`. The code/message pairs are wire-stable; kiosk
//! frontends switch on them.

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::reader::{CardReader, IdRecord};
use crate::{session, Error, Result};

pub const CODE_SUCCESS: u32 = 200000;
pub const CODE_CONTEXT_FAIL: u32 = 400001;
pub const CODE_NO_READER: u32 = 400002;
pub const CODE_CARD_UNRESPONSIVE: u32 = 400003;
pub const CODE_READ_FAIL: u32 = 400004;

#[derive(Debug, Serialize)]
pub struct Envelope {
    pub code: u32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<IdRecord>,
}

impl Envelope {
    pub fn success(data: IdRecord) -> Self {
        Self {
            code: CODE_SUCCESS,
            message: "ID card read successfully".into(),
            data: Some(data),
        }
    }

    pub fn failure(err: &Error) -> Self {
        let (code, message) = match err {
            Error::Context(_) => (CODE_CONTEXT_FAIL, "Failed to establish PC/SC context"),
            Error::NoReader => (CODE_NO_READER, "No card reader found"),
            Error::Connect(_) => (CODE_CARD_UNRESPONSIVE, "Card unresponsive or not detected"),
            Error::ReadFail | Error::Transport(_) => {
                (CODE_READ_FAIL, "Failed to read ID data from card")
            }
        };
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

struct AppState {
    delay: Duration,
    /// One transaction at a time; the reader can't multiplex cards.
    reader_lock: Mutex<()>,
}

/// Connect to the first reader and run one full transaction.
pub fn read_once(delay: Duration) -> Result<IdRecord> {
    let card = session::connect()?;
    CardReader::with_delay(card, delay).read()
}

async fn read_handler(State(state): State<Arc<AppState>>) -> Json<Envelope> {
    let result = tokio::task::spawn_blocking(move || {
        let _guard = state
            .reader_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        read_once(state.delay)
    })
    .await;

    match result {
        Ok(Ok(record)) => Json(Envelope::success(record)),
        Ok(Err(err)) => {
            warn!("card read failed: {}", err);
            Json(Envelope::failure(&err))
        }
        Err(err) => {
            error!("card read task panicked: {}", err);
            Json(Envelope::failure(&Error::ReadFail))
        }
    }
}

pub fn router(delay: Duration) -> Router {
    let state = Arc::new(AppState {
        delay,
        reader_lock: Mutex::new(()),
    });
    Router::new()
        .route("/api/read", get(read_handler))
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, delay: Duration) -> io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "HTTP API listening");
    axum::serve(listener, router(delay)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_includes_data() {
        let record = IdRecord {
            cid: "1234567890123".into(),
            ..IdRecord::default()
        };
        let json = serde_json::to_value(Envelope::success(record)).unwrap();
        assert_eq!(json["code"], 200000);
        assert_eq!(json["message"], "ID card read successfully");
        assert_eq!(json["data"]["cid"], "1234567890123");
        assert_eq!(json["data"]["photo"], "");
    }

    #[test]
    fn failure_envelope_omits_data() {
        let json = serde_json::to_value(Envelope::failure(&Error::ReadFail)).unwrap();
        assert_eq!(json["code"], 400004);
        assert_eq!(json["message"], "Failed to read ID data from card");
        assert!(json.as_object().unwrap().get("data").is_none());
    }

    #[test]
    fn error_code_mapping() {
        let cases = [
            (Error::Context(pcsc::Error::NoService), CODE_CONTEXT_FAIL),
            (Error::NoReader, CODE_NO_READER),
            (
                Error::Connect(pcsc::Error::NoSmartcard),
                CODE_CARD_UNRESPONSIVE,
            ),
            (Error::ReadFail, CODE_READ_FAIL),
            (Error::Transport(pcsc::Error::NoSmartcard), CODE_READ_FAIL),
        ];
        for (err, code) in cases {
            assert_eq!(Envelope::failure(&err).code, code, "{}", err);
        }
    }
}
