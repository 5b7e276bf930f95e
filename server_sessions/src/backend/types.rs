use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// The live session mapping. Values are arbitrary JSON so callers can store
/// anything serde can serialize.
pub type SessionData = HashMap<String, Value>;

/// Host store status as reported by [`SessionBackend::status`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreStatus {
    #[default]
    Inactive,
    Active,
}

/// Session cookie parameters, applied before the store is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    pub lifetime: u64,
    pub path: String,
    pub domain: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: String,
}

/// Session parameters, applied before the store is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionParams {
    pub name: String,
    pub sid_length: u32,
    pub sid_bits_per_character: u8,
    pub use_strict_mode: bool,
    pub cache_limiter: String,
    pub referer_check: String,
}

/// Attributes of an explicitly emitted cookie, used for invalidation on
/// destroy (empty value, expiry in the past).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieAttributes {
    pub expires_at: DateTime<Utc>,
    pub max_age: i64,
    pub path: String,
    pub domain: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: String,
}

/// Where the host environment started sending output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadersSentAt {
    pub file: String,
    pub line: u32,
}

/// The host store collaborator the session manager drives.
///
/// Implementations own the cookie transport and the persistence of session
/// bytes; the manager owns transition timing. Store I/O calls are awaited
/// fail-fast and report failure through their `bool` return; the manager
/// performs no retries. The live mapping is owned by the backend (it models
/// the host-managed session array) and must read as empty while no session
/// is active.
#[async_trait]
pub trait SessionBackend: Send {
    /// Apply session cookie parameters. Fails when a session is already active.
    fn configure_cookie(&mut self, cookie: &CookieOptions) -> bool;

    /// Apply session parameters. Fails when a session is already active.
    fn configure_session(&mut self, params: &SessionParams) -> bool;

    /// Allocate or resume a session and make the mapping live.
    async fn open(&mut self) -> bool;

    /// Persist the live mapping and close the session.
    async fn write_close(&mut self) -> bool;

    /// Drop every entry from the live mapping.
    fn unset_all(&mut self) -> bool;

    /// Fully terminate the session and forget its persisted data.
    async fn terminate(&mut self) -> bool;

    /// Switch to a freshly generated session ID. With `preserve_data` the
    /// live mapping carries over unchanged; without it the mapping is reset.
    async fn regenerate_id(&mut self, preserve_data: bool) -> bool;

    fn status(&self) -> StoreStatus;

    /// The current session ID, or an empty string when none is assigned.
    fn id(&self) -> String;

    /// Whether the host has already begun sending output, and where.
    fn headers_sent(&self) -> Option<HeadersSentAt>;

    /// Emit a cookie with explicit attributes.
    fn set_cookie(&mut self, name: &str, value: &str, attributes: &CookieAttributes);

    /// The live mapping. Empty while no session is active.
    fn entries(&self) -> &SessionData;

    fn entries_mut(&mut self) -> &mut SessionData;
}
