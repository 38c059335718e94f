// Shortened URL DTOs
//
// Mirrors the JSON the shortlink service speaks on /api/save.
// The stored path travels under the `url` key on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Request body for `POST /api/save`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortenUrlRequest {
    /// URL to shorten
    pub url: String,
    /// Event the link belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// User that owns the link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl ShortenUrlRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// A stored short link as returned by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlCollection {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub host: String,
    #[serde(default, rename = "url", alias = "path")]
    pub path: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    /// Short code, indexed server side
    #[serde(default)]
    pub code: String,
    /// Number of redirects served
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Default for UrlCollection {
    fn default() -> Self {
        Self {
            id: String::new(),
            host: String::new(),
            path: String::new(),
            params: BTreeMap::new(),
            code: String::new(),
            count: 0,
            event_id: None,
            user_id: None,
            created_at: Utc::now(),
            updated_at: None,
            deleted_at: None,
        }
    }
}

impl UrlCollection {
    /// Render the redirect target as `https://{host}{path}?{params}`.
    ///
    /// The path is percent-encoded as a path (`/` kept, `?` and `#`
    /// escaped). Params are emitted in key order with query-component
    /// escaping: spaces become `+`, only `-_.~` and alphanumerics pass
    /// through. The `?` is omitted when there are no params.
    pub fn compose_url_string(&self) -> String {
        let mut composed = format!("https://{}", self.host);

        if !self.path.is_empty() {
            if !self.path.starts_with('/') {
                composed.push('/');
            }
            composed.push_str(&escape(&self.path, Escape::Path));
        }

        if !self.params.is_empty() {
            let query = self
                .params
                .iter()
                .map(|(k, v)| {
                    format!(
                        "{}={}",
                        escape(k, Escape::QueryComponent),
                        escape(v, Escape::QueryComponent)
                    )
                })
                .collect::<Vec<_>>()
                .join("&");
            composed.push('?');
            composed.push_str(&query);
        }

        composed
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escape {
    Path,
    QueryComponent,
}

// Reserved characters survive in a path (except `?`); in a query component
// only the unreserved set does.
fn should_escape(byte: u8, mode: Escape) -> bool {
    if byte.is_ascii_alphanumeric() {
        return false;
    }
    match byte {
        b'-' | b'_' | b'.' | b'~' => false,
        b'$' | b'&' | b'+' | b',' | b'/' | b':' | b';' | b'=' | b'?' | b'@' => match mode {
            Escape::Path => byte == b'?',
            Escape::QueryComponent => true,
        },
        _ => true,
    }
}

fn escape(raw: &str, mode: Escape) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";

    let mut out = String::with_capacity(raw.len());
    for &byte in raw.as_bytes() {
        if byte == b' ' && mode == Escape::QueryComponent {
            out.push('+');
        } else if should_escape(byte, mode) {
            out.push('%');
            out.push(HEX[(byte >> 4) as usize] as char);
            out.push(HEX[(byte & 0x0f) as usize] as char);
        } else {
            out.push(byte as char);
        }
    }
    out
}
