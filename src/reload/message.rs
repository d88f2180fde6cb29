//! LiveReload Message Protocol
//!
//! JSON frames exchanged with the browser client over `/livereload`.
//!
//! # Client frames
//!
//! - `hello`: handshake, lists the protocols the client speaks
//! - `info`: page URL the client is showing (plus plugin data we ignore)
//!
//! # Server frames
//!
//! - `hello`: handshake reply
//! - `reload`: reload one asset or the whole page

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// The only protocol this server speaks.
pub const PROTOCOL_OFFICIAL_7: &str = "http://livereload.com/protocols/official-7";

/// Name advertised in the handshake reply.
pub const SERVER_NAME: &str = "livereload-aiohttp";

// =============================================================================
// Client -> Server
// =============================================================================

/// A decoded client frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Hello { protocols: Vec<String> },
    Info { url: String },
    /// Well formed JSON with a command we do not handle.
    Unknown { command: String },
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message has no \"command\" field")]
    MissingCommand,
}

#[derive(Deserialize)]
struct HelloFrame {
    #[serde(default)]
    protocols: Vec<String>,
}

#[derive(Deserialize)]
struct InfoFrame {
    url: String,
}

impl ClientMessage {
    /// Decode a text frame.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(text)?;
        let command = value
            .get("command")
            .and_then(Value::as_str)
            .ok_or(ProtocolError::MissingCommand)?
            .to_string();

        match command.as_str() {
            "hello" => {
                let frame: HelloFrame = serde_json::from_value(value)?;
                Ok(Self::Hello {
                    protocols: frame.protocols,
                })
            }
            "info" => {
                let frame: InfoFrame = serde_json::from_value(value)?;
                Ok(Self::Info { url: frame.url })
            }
            _ => Ok(Self::Unknown { command }),
        }
    }

    /// Whether a `hello` lists the protocol we speak.
    pub fn speaks_official_7(protocols: &[String]) -> bool {
        protocols.iter().any(|p| p == PROTOCOL_OFFICIAL_7)
    }
}

/// Path part of a page URL reported in an `info` frame.
///
/// Everything after the third `/` (scheme and authority are dropped), so
/// `http://localhost:8000/foo/bar?x=1` becomes `/foo/bar?x=1`.
pub fn page_path(url: &str) -> String {
    let tail = url.splitn(4, '/').last().unwrap_or_default();
    format!("/{tail}")
}

// =============================================================================
// Server -> Client
// =============================================================================

/// Frame sent to browser clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum ServerMessage {
    Hello {
        protocols: Vec<String>,
        #[serde(rename = "serverName")]
        server_name: String,
    },
    Reload {
        path: String,
        #[serde(rename = "liveCSS")]
        live_css: bool,
        #[serde(rename = "liveImg")]
        live_img: bool,
    },
}

impl ServerMessage {
    /// Handshake reply.
    pub fn hello() -> Self {
        Self::Hello {
            protocols: vec![PROTOCOL_OFFICIAL_7.to_string()],
            server_name: SERVER_NAME.to_string(),
        }
    }

    /// Reload `path`, letting the client swap stylesheets and images in place.
    pub fn reload(path: impl Into<String>) -> Self {
        Self::Reload {
            path: path.into(),
            live_css: true,
            live_img: true,
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"command":"reload","path":"/"}"#.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hello() {
        let msg = ClientMessage::parse(
            r#"{"command":"hello","protocols":["http://livereload.com/protocols/official-7"]}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::Hello { protocols } => {
                assert!(ClientMessage::speaks_official_7(&protocols));
            }
            other => panic!("expected hello, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_hello_without_protocol_7() {
        let msg = ClientMessage::parse(
            r#"{"command":"hello","protocols":["http://livereload.com/protocols/official-6"]}"#,
        )
        .unwrap();
        let ClientMessage::Hello { protocols } = msg else {
            panic!("expected hello");
        };
        assert!(!ClientMessage::speaks_official_7(&protocols));
    }

    #[test]
    fn test_parse_info_ignores_extra_fields() {
        let msg = ClientMessage::parse(
            r#"{"command":"info","url":"http://localhost:8000/foo","plugins":{"less":{}}}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::Info {
                url: "http://localhost:8000/foo".into()
            }
        );
    }

    #[test]
    fn test_parse_unknown_and_malformed() {
        assert_eq!(
            ClientMessage::parse(r#"{"command":"ping"}"#).unwrap(),
            ClientMessage::Unknown {
                command: "ping".into()
            }
        );
        assert!(matches!(
            ClientMessage::parse("not json"),
            Err(ProtocolError::Json(_))
        ));
        assert!(matches!(
            ClientMessage::parse(r#"{"url":"x"}"#),
            Err(ProtocolError::MissingCommand)
        ));
    }

    #[test]
    fn test_page_path() {
        assert_eq!(page_path("http://localhost:8000/foo/bar?x=1"), "/foo/bar?x=1");
        assert_eq!(page_path("http://localhost:8000/"), "/");
        assert_eq!(page_path("http://localhost:8000/static/"), "/static/");
    }

    #[test]
    fn test_server_hello_shape() {
        let json: Value = serde_json::from_str(&ServerMessage::hello().to_json()).unwrap();
        assert_eq!(json["command"], "hello");
        assert_eq!(json["protocols"][0], PROTOCOL_OFFICIAL_7);
        assert_eq!(json["serverName"], "livereload-aiohttp");
    }

    #[test]
    fn test_reload_shape() {
        let json: Value =
            serde_json::from_str(&ServerMessage::reload("/static/app.css").to_json()).unwrap();
        assert_eq!(json["command"], "reload");
        assert_eq!(json["path"], "/static/app.css");
        assert_eq!(json["liveCSS"], true);
        assert_eq!(json["liveImg"], true);
    }
}
