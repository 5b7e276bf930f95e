use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use http::HeaderMap;
use http::header::{CACHE_CONTROL, EXPIRES, PRAGMA};
use ring::rand::SecureRandom;

use crate::utils::{append_set_cookie, format_set_cookie, http_date};

use super::types::{
    CookieAttributes, CookieOptions, HeadersSentAt, SessionBackend, SessionData, SessionParams,
    StoreStatus,
};

// Session ID alphabets keyed by bits per character: hex, extended hex, and
// the 64-character set.
const ALPHABET_4: &[u8] = b"0123456789abcdef";
const ALPHABET_5: &[u8] = b"0123456789abcdefghijklmnopqrstuv";
const ALPHABET_6: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ-,";

/// A cookie emitted by the backend, kept for inspection by the embedding host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    pub attributes: CookieAttributes,
}

/// In-memory host store.
///
/// Holds the live mapping while a session is active and a persisted copy per
/// session ID across `write_close`/`open` cycles. The incoming cookie value
/// is supplied through [`MemoryBackend::request_id`]; under strict mode an ID
/// with no persisted session is rejected and a fresh one is generated.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    cookie: Option<CookieOptions>,
    params: Option<SessionParams>,
    status: StoreStatus,
    id: String,
    requested_id: Option<String>,
    live: SessionData,
    persisted: HashMap<String, SessionData>,
    cookies: Vec<CookieRecord>,
    headers: HeaderMap,
    headers_sent_at: Option<HeadersSentAt>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        tracing::debug!("Creating new in-memory session backend");
        Self::default()
    }

    /// Supplies the session ID presented by the client, as a constructor.
    pub fn with_requested_id(id: impl Into<String>) -> Self {
        let mut backend = Self::new();
        backend.request_id(id);
        backend
    }

    /// Supplies the session ID presented by the client for the next `open`.
    pub fn request_id(&mut self, id: impl Into<String>) {
        self.requested_id = Some(id.into());
    }

    /// Marks the point where the host began sending output.
    pub fn mark_headers_sent(&mut self, file: impl Into<String>, line: u32) {
        self.headers_sent_at = Some(HeadersSentAt {
            file: file.into(),
            line,
        });
    }

    /// Every cookie emitted so far, in emission order.
    pub fn cookies(&self) -> &[CookieRecord] {
        &self.cookies
    }

    /// The emitted cookies as `Set-Cookie` headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Whether a persisted session exists for `id`.
    pub fn has_persisted(&self, id: &str) -> bool {
        self.persisted.contains_key(id)
    }

    fn generate_sid(&self, params: &SessionParams) -> Option<String> {
        let alphabet = match params.sid_bits_per_character {
            5 => ALPHABET_5,
            6 => ALPHABET_6,
            _ => ALPHABET_4,
        };
        let mask = (alphabet.len() - 1) as u8;

        let rng = ring::rand::SystemRandom::new();
        let mut bytes = vec![0u8; params.sid_length as usize];
        if rng.fill(&mut bytes).is_err() {
            tracing::error!("Failed to generate random session id");
            return None;
        }

        Some(
            bytes
                .iter()
                .map(|b| alphabet[(b & mask) as usize] as char)
                .collect(),
        )
    }

    fn session_cookie_attributes(&self, cookie: &CookieOptions) -> CookieAttributes {
        CookieAttributes {
            expires_at: Utc::now() + Duration::seconds(cookie.lifetime as i64),
            max_age: cookie.lifetime as i64,
            path: cookie.path.clone(),
            domain: cookie.domain.clone(),
            secure: cookie.secure,
            http_only: cookie.http_only,
            same_site: cookie.same_site.clone(),
        }
    }

    fn emit_session_cookie(&mut self) {
        let (Some(cookie), Some(params)) = (self.cookie.clone(), self.params.clone()) else {
            return;
        };
        let attributes = self.session_cookie_attributes(&cookie);
        let id = self.id.clone();
        self.set_cookie(&params.name, &id, &attributes);
    }

    // Caching headers emitted alongside the session cookie, per the
    // configured cache limiter policy.
    fn emit_cache_headers(&mut self, params: &SessionParams) {
        let max_age = self.cookie.as_ref().map_or(0, |c| c.lifetime);
        let insert = |headers: &mut HeaderMap, name, value: String| {
            if let Ok(value) = value.parse() {
                headers.insert(name, value);
            }
        };
        match params.cache_limiter.as_str() {
            "nocache" => {
                insert(
                    &mut self.headers,
                    EXPIRES,
                    http_date(Utc::now() - Duration::days(365)),
                );
                insert(
                    &mut self.headers,
                    CACHE_CONTROL,
                    "no-store, no-cache, must-revalidate".to_string(),
                );
                insert(&mut self.headers, PRAGMA, "no-cache".to_string());
            }
            "private" => {
                insert(
                    &mut self.headers,
                    EXPIRES,
                    http_date(Utc::now() - Duration::days(365)),
                );
                insert(
                    &mut self.headers,
                    CACHE_CONTROL,
                    format!("private, max-age={max_age}"),
                );
            }
            "private_no_expire" => {
                insert(
                    &mut self.headers,
                    CACHE_CONTROL,
                    format!("private, max-age={max_age}"),
                );
            }
            "public" => {
                insert(
                    &mut self.headers,
                    EXPIRES,
                    http_date(Utc::now() + Duration::seconds(max_age as i64)),
                );
                insert(
                    &mut self.headers,
                    CACHE_CONTROL,
                    format!("public, max-age={max_age}"),
                );
            }
            _ => {}
        }
    }

    fn is_active(&self) -> bool {
        self.status == StoreStatus::Active
    }
}

#[async_trait]
impl SessionBackend for MemoryBackend {
    fn configure_cookie(&mut self, cookie: &CookieOptions) -> bool {
        if self.is_active() {
            return false;
        }
        self.cookie = Some(cookie.clone());
        true
    }

    fn configure_session(&mut self, params: &SessionParams) -> bool {
        if self.is_active() {
            return false;
        }
        self.params = Some(params.clone());
        true
    }

    async fn open(&mut self) -> bool {
        if self.is_active() {
            return false;
        }
        let Some(params) = self.params.clone() else {
            tracing::error!("Session parameters not configured");
            return false;
        };

        // An explicitly requested ID wins over the ID of a previously closed
        // session in this backend.
        let candidate = self.requested_id.take().or_else(|| {
            if self.id.is_empty() {
                None
            } else {
                Some(self.id.clone())
            }
        });

        let id = match candidate {
            Some(id) if self.persisted.contains_key(&id) => id,
            // Strict mode rejects IDs the store has never seen
            Some(id) if !params.use_strict_mode => id,
            _ => match self.generate_sid(&params) {
                Some(id) => id,
                None => return false,
            },
        };

        self.live = self.persisted.get(&id).cloned().unwrap_or_default();
        self.id = id;
        self.status = StoreStatus::Active;
        self.emit_session_cookie();
        self.emit_cache_headers(&params);
        tracing::debug!("Opened session {}", self.id);
        true
    }

    async fn write_close(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.persisted.insert(self.id.clone(), self.live.clone());
        self.status = StoreStatus::Inactive;
        tracing::debug!("Persisted and closed session {}", self.id);
        true
    }

    fn unset_all(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.live.clear();
        true
    }

    async fn terminate(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.persisted.remove(&self.id);
        tracing::debug!("Terminated session {}", self.id);
        self.id.clear();
        self.status = StoreStatus::Inactive;
        true
    }

    async fn regenerate_id(&mut self, preserve_data: bool) -> bool {
        if !self.is_active() {
            return false;
        }
        let Some(params) = self.params.clone() else {
            return false;
        };
        let Some(new_id) = self.generate_sid(&params) else {
            return false;
        };

        let old_id = std::mem::replace(&mut self.id, new_id);
        if let Some(data) = self.persisted.remove(&old_id) {
            if preserve_data {
                self.persisted.insert(self.id.clone(), data);
            }
        }
        if !preserve_data {
            self.live.clear();
        }
        self.emit_session_cookie();
        tracing::debug!("Regenerated session id {} -> {}", old_id, self.id);
        true
    }

    fn status(&self) -> StoreStatus {
        self.status
    }

    fn id(&self) -> String {
        self.id.clone()
    }

    fn headers_sent(&self) -> Option<HeadersSentAt> {
        self.headers_sent_at.clone()
    }

    fn set_cookie(&mut self, name: &str, value: &str, attributes: &CookieAttributes) {
        append_set_cookie(
            &mut self.headers,
            &format_set_cookie(name, value, attributes),
        );
        self.cookies.push(CookieRecord {
            name: name.to_string(),
            value: value.to_string(),
            attributes: attributes.clone(),
        });
    }

    fn entries(&self) -> &SessionData {
        &self.live
    }

    fn entries_mut(&mut self) -> &mut SessionData {
        &mut self.live
    }
}
