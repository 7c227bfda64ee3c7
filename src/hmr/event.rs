//! Hot Update Message Protocol
//!
//! Defines the JSON message format for WebSocket communication between
//! the development server and browser clients.
//!
//! # Message Types
//!
//! - `reload`: Trigger full page reload
//! - `css-update`: Swap updated stylesheets without a reload
//! - `js-update`: Script changed (clients currently respond with a reload)
//! - `error`: Display a build error overlay

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Hot update message sent over WebSocket
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HmrEvent {
    /// Full page reload (content or template changed)
    Reload {
        /// Source path that triggered the reload
        #[serde(skip_serializing_if = "Option::is_none")]
        path: Option<String>,
        /// Milliseconds since the Unix epoch
        timestamp: u64,
    },

    /// Stylesheet update (fast path, clients patch `<link>` hrefs in place)
    CssUpdate {
        /// Changed stylesheet paths
        paths: Vec<String>,
        timestamp: u64,
    },

    /// Script update
    JsUpdate {
        paths: Vec<String>,
        timestamp: u64,
    },

    /// Build error (display overlay, no reload)
    Error {
        /// Human-readable error message
        message: String,
        /// Source file path, when known
        #[serde(skip_serializing_if = "Option::is_none")]
        path: Option<String>,
        timestamp: u64,
    },

    /// Connection established
    Connected {
        /// Server-assigned client id
        #[serde(rename = "clientId")]
        client_id: u64,
        /// Server version for compatibility check
        version: String,
    },
}

/// How a connected client should react to a change at a path, decided by
/// extension. Stylesheets patch in place; scripts and everything else
/// (content, markup) reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    Style,
    Script,
    Reload,
}

impl UpdateKind {
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("css") => Self::Style,
            Some("js") | Some("mjs") => Self::Script,
            _ => Self::Reload,
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

impl HmrEvent {
    /// Create a reload message
    pub fn reload(path: Option<String>) -> Self {
        Self::Reload {
            path,
            timestamp: now_ms(),
        }
    }

    /// Create a stylesheet update message
    pub fn css_update(paths: Vec<String>) -> Self {
        Self::CssUpdate {
            paths,
            timestamp: now_ms(),
        }
    }

    /// Create a script update message
    pub fn js_update(paths: Vec<String>) -> Self {
        Self::JsUpdate {
            paths,
            timestamp: now_ms(),
        }
    }

    /// Create an error overlay message
    pub fn error(message: impl Into<String>, path: Option<String>) -> Self {
        Self::Error {
            message: message.into(),
            path,
            timestamp: now_ms(),
        }
    }

    /// Create a connected message
    pub fn connected(client_id: u64) -> Self {
        Self::Connected {
            client_id,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }

    /// Parse from JSON string
    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_reload_serialization() {
        let json = HmrEvent::reload(Some("/content/post.md".into())).to_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "reload");
        assert_eq!(value["path"], "/content/post.md");
        assert!(value["timestamp"].as_u64().is_some());
    }

    #[test]
    fn test_css_update_serialization() {
        let json = HmrEvent::css_update(vec!["/static/site.css".into()]).to_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "css-update");
        assert_eq!(value["paths"][0], "/static/site.css");
    }

    #[test]
    fn test_error_serialization() {
        let json = HmrEvent::error("bad frontmatter", None).to_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["message"], "bad frontmatter");
        assert!(value.get("path").is_none());
    }

    #[test]
    fn test_update_kind_from_extension() {
        assert_eq!(
            UpdateKind::for_path(&PathBuf::from("a/style.css")),
            UpdateKind::Style
        );
        assert_eq!(
            UpdateKind::for_path(&PathBuf::from("a/app.js")),
            UpdateKind::Script
        );
        assert_eq!(
            UpdateKind::for_path(&PathBuf::from("a/mod.mjs")),
            UpdateKind::Script
        );
        assert_eq!(
            UpdateKind::for_path(&PathBuf::from("a/post.md")),
            UpdateKind::Reload
        );
    }

    #[test]
    fn test_round_trip() {
        let event = HmrEvent::js_update(vec!["/app.js".into()]);
        let parsed = HmrEvent::from_json(&event.to_json()).unwrap();
        assert!(matches!(parsed, HmrEvent::JsUpdate { paths, .. } if paths == vec!["/app.js"]));
    }
}
