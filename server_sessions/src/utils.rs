use chrono::{DateTime, Utc};
use http::HeaderMap;
use http::header::SET_COOKIE;

use crate::backend::CookieAttributes;

/// Formats a timestamp as an RFC 7231 HTTP date.
pub(crate) fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Renders a `Set-Cookie` header value with explicit attributes.
pub(crate) fn format_set_cookie(name: &str, value: &str, attrs: &CookieAttributes) -> String {
    let mut cookie = format!(
        "{name}={value}; Path={path}; Max-Age={max_age}; Expires={expires}; SameSite={same_site}",
        path = attrs.path,
        max_age = attrs.max_age,
        expires = http_date(attrs.expires_at),
        same_site = attrs.same_site,
    );
    if !attrs.domain.is_empty() {
        cookie.push_str("; Domain=");
        cookie.push_str(&attrs.domain);
    }
    if attrs.secure {
        cookie.push_str("; Secure");
    }
    if attrs.http_only {
        cookie.push_str("; HttpOnly");
    }
    cookie
}

/// Appends a `Set-Cookie` header, dropping values the header type rejects.
pub(crate) fn append_set_cookie(headers: &mut HeaderMap, cookie: &str) {
    match cookie.parse() {
        Ok(value) => {
            headers.append(SET_COOKIE, value);
        }
        Err(_) => {
            tracing::error!("Failed to parse cookie header: {cookie}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn attrs() -> CookieAttributes {
        CookieAttributes {
            expires_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
            max_age: 3600,
            path: "/".to_string(),
            domain: String::new(),
            secure: false,
            http_only: true,
            same_site: "Lax".to_string(),
        }
    }

    #[test]
    fn test_format_set_cookie() {
        let cookie = format_set_cookie("SESSIONID", "abc123", &attrs());
        assert_eq!(
            cookie,
            "SESSIONID=abc123; Path=/; Max-Age=3600; \
             Expires=Sat, 01 Mar 2025 12:00:00 GMT; SameSite=Lax; HttpOnly"
        );
    }

    #[test]
    fn test_format_set_cookie_full_attributes() {
        let mut attrs = attrs();
        attrs.domain = "example.com".to_string();
        attrs.secure = true;
        attrs.same_site = "Strict".to_string();

        let cookie = format_set_cookie("SESSIONID", "abc123", &attrs);
        assert!(cookie.contains("; Domain=example.com"));
        assert!(cookie.contains("; Secure"));
        assert!(cookie.contains("SameSite=Strict"));
    }

    #[test]
    fn test_format_invalidation_cookie() {
        let mut attrs = attrs();
        attrs.max_age = -7200;

        let cookie = format_set_cookie("SESSIONID", "", &attrs);
        assert!(cookie.starts_with("SESSIONID=; "));
        assert!(cookie.contains("Max-Age=-7200"));
    }

    #[test]
    fn test_append_set_cookie() {
        let mut headers = HeaderMap::new();
        append_set_cookie(&mut headers, "SESSIONID=abc123; Path=/");
        append_set_cookie(&mut headers, "SESSIONID=; Path=/; Max-Age=-7200");

        let values: Vec<_> = headers.get_all(SET_COOKIE).iter().collect();
        assert_eq!(values.len(), 2);
    }
}
