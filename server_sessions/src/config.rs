//! Session configuration.
//!
//! A [`SessionConfig`] is a plain value object; values arrive from deployment
//! config or the environment and are validated exactly once, when the session
//! manager is constructed.

use std::env;

use crate::backend::{CookieOptions, SessionParams};
use crate::errors::ConfigErrors;
use crate::validation::{self, NAME_PATTERN, Validator};

/// Configuration for the session cookie and the underlying store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    // Session cookie config
    pub lifetime: u64,
    pub path: String,
    pub domain: String,
    pub secure: bool, // Should be true for production with HTTPS connection
    pub http_only: bool,
    pub same_site: String, // Should be "Strict" in production

    // Session config
    pub name: String,
    pub sid_length: u32, // Should be 96 in production
    pub sid_bits_per_character: u8, // Should be 6 in production
    pub use_strict_mode: bool, // Should be true in production
    pub cache_limiter: String,
    pub referer_check: String, // Should be set if domain is set
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lifetime: 3600,
            path: "/".to_string(),
            domain: String::new(),
            secure: false,
            http_only: true,
            same_site: "Lax".to_string(),
            name: "SESSIONID".to_string(),
            sid_length: 32,
            sid_bits_per_character: 4,
            use_strict_mode: false,
            cache_limiter: "nocache".to_string(),
            referer_check: String::new(),
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a config from `SESSION_*` environment variables, falling back
    /// to the default for any variable that is absent or unparsable.
    ///
    /// A `.env` file is loaded first when present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();
        Self {
            lifetime: parse_var("SESSION_LIFETIME", defaults.lifetime),
            path: string_var("SESSION_PATH", defaults.path),
            domain: string_var("SESSION_DOMAIN", defaults.domain),
            secure: parse_var("SESSION_SECURE", defaults.secure),
            http_only: parse_var("SESSION_HTTP_ONLY", defaults.http_only),
            same_site: string_var("SESSION_SAME_SITE", defaults.same_site),
            name: string_var("SESSION_NAME", defaults.name),
            sid_length: parse_var("SESSION_SID_LENGTH", defaults.sid_length),
            sid_bits_per_character: parse_var(
                "SESSION_SID_BITS_PER_CHARACTER",
                defaults.sid_bits_per_character,
            ),
            use_strict_mode: parse_var("SESSION_USE_STRICT_MODE", defaults.use_strict_mode),
            cache_limiter: string_var("SESSION_CACHE_LIMITER", defaults.cache_limiter),
            referer_check: string_var("SESSION_REFERER_CHECK", defaults.referer_check),
        }
    }

    /// Checks every constrained field, collecting all violations.
    pub(crate) fn validate(&self) -> Result<(), ConfigErrors> {
        let mut v = Validator::new();
        v.check(
            validation::permitted(&self.same_site.as_str(), &["Strict", "Lax"]),
            "samesite",
            "Can only be set to \"Strict\" or \"Lax\"",
        );
        v.check(
            validation::matches(&self.name, &NAME_PATTERN),
            "name",
            "Must only contain alphanumerical characters",
        );
        v.check(
            validation::between(self.sid_length, 22, 256),
            "sid_length",
            "Must be between 22 and 256",
        );
        v.check(
            validation::permitted(&self.sid_bits_per_character, &[4, 5, 6]),
            "sid_bits_per_character",
            "Can only be 4, 5 or 6",
        );
        v.check(
            validation::permitted(
                &self.cache_limiter.as_str(),
                &["nocache", "private", "private_no_expire", "public"],
            ),
            "cache_limiter",
            "Can only be one of the following values: \"nocache\", \"private\", \"private_no_expire\", \"public\"",
        );

        if v.is_valid() {
            Ok(())
        } else {
            Err(ConfigErrors::new(v.into_errors()))
        }
    }

    /// The cookie parameter record handed to the backend on start.
    pub fn cookie_options(&self) -> CookieOptions {
        CookieOptions {
            lifetime: self.lifetime,
            path: self.path.clone(),
            domain: self.domain.clone(),
            secure: self.secure,
            http_only: self.http_only,
            same_site: self.same_site.clone(),
        }
    }

    /// The session parameter record handed to the backend on start.
    pub fn session_params(&self) -> SessionParams {
        SessionParams {
            name: self.name.clone(),
            sid_length: self.sid_length,
            sid_bits_per_character: self.sid_bits_per_character,
            use_strict_mode: self.use_strict_mode,
            cache_limiter: self.cache_limiter.clone(),
            referer_check: self.referer_check.clone(),
        }
    }
}

fn string_var(key: &str, default: String) -> String {
    env::var(key).ok().unwrap_or(default)
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
