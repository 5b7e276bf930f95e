use chrono::{Duration, Utc};
use serde_json::{Map, Value};

use crate::backend::{CookieAttributes, SessionBackend, StoreStatus};
use crate::config::SessionConfig;
use crate::errors::SessionError;

/// Key of the reserved flash-message entry inside the session mapping.
pub const DEFAULT_FLASH_KEY: &str = "_flash_messages";

// How far in the past the invalidation cookie expires on destroy.
const INVALIDATION_BACKDATE_SECS: i64 = 7200;

/// A cookie-identified server-side session.
///
/// Owns the lifecycle state machine over the injected backend: not started,
/// active, destroyed (destroy returns the session to a startable state). The
/// key/value accessors and the flash store operate on the mapping made live
/// by [`Session::start`].
#[derive(Debug)]
pub struct Session<B: SessionBackend> {
    config: SessionConfig,
    backend: B,
    flash_key: String,
}

impl<B: SessionBackend> Session<B> {
    /// Validates `config` and constructs the manager.
    ///
    /// All violations are collected; the returned [`SessionError::Config`]
    /// reports the first and carries the rest. No manager is constructed on
    /// failure.
    pub fn new(config: SessionConfig, backend: B) -> Result<Self, SessionError> {
        Self::with_flash_key(config, backend, DEFAULT_FLASH_KEY)
    }

    /// Like [`Session::new`] with an explicit flash namespace key.
    pub fn with_flash_key(
        config: SessionConfig,
        backend: B,
        flash_key: impl Into<String>,
    ) -> Result<Self, SessionError> {
        config.validate().map_err(SessionError::Config)?;
        Ok(Self {
            config,
            backend,
            flash_key: flash_key.into(),
        })
    }

    /// Starts the session: applies cookie and session parameters, opens the
    /// underlying store and seeds the flash namespace.
    ///
    /// Fails without changing state when the session is already active, when
    /// the host has begun sending output, or when any host call is rejected.
    pub async fn start(&mut self) -> Result<(), SessionError> {
        if self.is_started() {
            return Err(SessionError::AlreadyStarted);
        }
        if let Some(at) = self.backend.headers_sent() {
            return Err(SessionError::HeadersSent {
                file: at.file,
                line: at.line,
            });
        }

        if !self.backend.configure_cookie(&self.config.cookie_options()) {
            return Err(SessionError::Cookie(
                "failed to set session cookie parameters".to_string(),
            ));
        }
        if !self.backend.configure_session(&self.config.session_params()) {
            return Err(SessionError::Cookie(
                "failed to set session parameters".to_string(),
            ));
        }
        if !self.backend.open().await {
            return Err(SessionError::Store("failed to start the session".to_string()));
        }

        // Seed an empty flash namespace on first start
        self.backend
            .entries_mut()
            .entry(self.flash_key.clone())
            .or_insert_with(|| Value::Object(Map::new()));

        tracing::debug!("Started session {}", self.backend.id());
        Ok(())
    }

    /// Whether a session is currently active. Pure query, any state.
    pub fn is_started(&self) -> bool {
        self.backend.status() == StoreStatus::Active
    }

    /// Assigns a new session ID, preserving every mapping entry.
    pub async fn regenerate_id(&mut self) -> Result<(), SessionError> {
        if !self.is_started() {
            return Err(SessionError::NotStarted);
        }
        if let Some(at) = self.backend.headers_sent() {
            return Err(SessionError::HeadersSent {
                file: at.file,
                line: at.line,
            });
        }

        if !self.backend.regenerate_id(true).await {
            return Err(SessionError::Store(
                "failed to regenerate session id".to_string(),
            ));
        }
        tracing::debug!("Regenerated session id, now {}", self.backend.id());
        Ok(())
    }

    /// Tears the session down: clears the mapping, invalidates the cookie
    /// and terminates the store. A no-op when no session is active.
    ///
    /// Teardown is best-effort-then-fail-loud: when unset or terminate is
    /// rejected the mapping stays cleared and the error surfaces.
    pub async fn destroy(&mut self) -> Result<(), SessionError> {
        if !self.is_started() {
            return Ok(());
        }

        let id = self.backend.id();
        self.backend.entries_mut().clear();

        let name = self.config.name.clone();
        let attributes = self.invalidation_attributes();
        self.backend.set_cookie(&name, "", &attributes);

        if !self.backend.unset_all() {
            return Err(SessionError::Store("failed to unset session".to_string()));
        }
        if !self.backend.terminate().await {
            return Err(SessionError::Store("failed to destroy session".to_string()));
        }
        tracing::debug!("Destroyed session {id}");
        Ok(())
    }

    /// The current session ID, or an empty string when not started/destroyed.
    pub fn id(&self) -> String {
        self.backend.id()
    }

    /// The configured session name, regardless of state.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Persists the session and closes the store. Never errors; failure is
    /// reported through the return value.
    pub async fn save(&mut self) -> bool {
        self.backend.write_close().await
    }

    /// The flash namespace key this session was constructed with.
    pub fn flash_key(&self) -> &str {
        &self.flash_key
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The injected backend, for host integration (incoming cookie IDs,
    /// emitted headers).
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    fn invalidation_attributes(&self) -> CookieAttributes {
        CookieAttributes {
            expires_at: Utc::now() - Duration::seconds(INVALIDATION_BACKDATE_SECS),
            max_age: -INVALIDATION_BACKDATE_SECS,
            path: self.config.path.clone(),
            domain: self.config.domain.clone(),
            secure: self.config.secure,
            http_only: self.config.http_only,
            same_site: self.config.same_site.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::config::SessionConfig;

    #[test]
    fn test_construction_validates_config() {
        let config = SessionConfig {
            same_site: "None".to_string(),
            ..Default::default()
        };

        let result = Session::new(config, MemoryBackend::new());
        match result {
            Err(SessionError::Config(errors)) => {
                let first = errors.first().unwrap();
                assert_eq!(first.field, "samesite");
                assert_eq!(first.message, "Can only be set to \"Strict\" or \"Lax\"");
            }
            other => panic!("Expected SessionError::Config, got: {other:?}"),
        }
    }

    #[test]
    fn test_construction_reports_first_of_many_violations() {
        let config = SessionConfig {
            sid_length: 300,
            sid_bits_per_character: 7,
            ..Default::default()
        };

        let err = Session::new(config, MemoryBackend::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid session configuration: sid_length -> Must be between 22 and 256"
        );
    }

    #[test]
    fn test_name_is_available_in_any_state() {
        let session = Session::new(SessionConfig::default(), MemoryBackend::new()).unwrap();
        assert_eq!(session.name(), "SESSIONID");
        assert!(!session.is_started());
        assert_eq!(session.id(), "");
    }

    #[test]
    fn test_custom_flash_key() {
        let session = Session::with_flash_key(
            SessionConfig::default(),
            MemoryBackend::new(),
            "_notices",
        )
        .unwrap();
        assert_eq!(session.flash_key(), "_notices");
    }
}
