//! server-sessions - Cookie-identified server-side session state
//!
//! This crate provides a session manager over an injectable host store:
//! a validated configuration layer, the start/regenerate/destroy lifecycle
//! state machine, typed key/value accessors over the active session mapping,
//! and a read-once flash-message store layered inside it.
//!
//! The host side (cookie transport, persistence of session bytes) is the
//! [`SessionBackend`] trait; [`MemoryBackend`] is a complete in-memory
//! implementation for tests and single-process embedding.
//!
//! ```
//! use server_sessions::{MemoryBackend, Session, SessionConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), server_sessions::SessionError> {
//! let config = SessionConfig {
//!     same_site: "Strict".to_string(),
//!     ..Default::default()
//! };
//! let mut session = Session::new(config, MemoryBackend::new())?;
//!
//! session.start().await?;
//! session.put("user_id", 42);
//! session.flash_put("notice", "Profile saved.");
//!
//! assert_eq!(session.get::<u32>("user_id"), Some(42));
//! assert_eq!(session.flash_get("notice").as_deref(), Some("Profile saved."));
//! assert_eq!(session.flash_get("notice"), None); // read once
//!
//! session.destroy().await?;
//! # Ok(())
//! # }
//! ```

mod backend;
mod config;
mod errors;
mod session;
mod utils;
mod validation;

pub use backend::{
    CookieAttributes, CookieOptions, CookieRecord, HeadersSentAt, MemoryBackend, SessionBackend,
    SessionData, SessionParams, StoreStatus,
};
pub use config::SessionConfig;
pub use errors::{ConfigErrors, SessionError};
pub use session::{DEFAULT_FLASH_KEY, Session};
pub use validation::{FieldError, NAME_PATTERN, Validator, between, matches, permitted};
