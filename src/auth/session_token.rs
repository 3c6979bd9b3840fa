/// Session token transport
///
/// Clients present the token either in the `token` cookie or as
/// `Authorization: Bearer <token>`. The cookie wins when both are present.

use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::http::header;
use actix_web::HttpRequest;

pub const SESSION_COOKIE: &str = "token";

/// Pull the session token off a request.
///
/// Returns `None` when there is no usable token: no cookie and no header, an
/// empty value, or an Authorization header with a scheme other than Bearer.
pub fn extract_session_token(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        let value = cookie.value().trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// HttpOnly cookie carrying a freshly issued token.
pub fn session_cookie(token: String, max_age_seconds: i64, secure: bool) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::seconds(max_age_seconds))
        .finish()
}

/// Cookie that tells the browser to drop the session cookie.
pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .finish();
    cookie.make_removal();
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn no_cookie_and_no_header_is_none() {
        let req = TestRequest::default().to_http_request();
        assert_eq!(extract_session_token(&req), None);
    }

    #[test]
    fn bearer_header_is_used() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer abc.def.ghi"))
            .to_http_request();
        assert_eq!(extract_session_token(&req).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn cookie_takes_precedence_over_header() {
        let req = TestRequest::default()
            .cookie(Cookie::new(SESSION_COOKIE, "from-cookie"))
            .insert_header((header::AUTHORIZATION, "Bearer from-header"))
            .to_http_request();
        assert_eq!(extract_session_token(&req).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn empty_cookie_falls_back_to_header() {
        let req = TestRequest::default()
            .cookie(Cookie::new(SESSION_COOKIE, ""))
            .insert_header((header::AUTHORIZATION, "Bearer from-header"))
            .to_http_request();
        assert_eq!(extract_session_token(&req).as_deref(), Some("from-header"));
    }

    #[test]
    fn malformed_headers_are_none() {
        for value in ["Bearer", "Bearer ", "Basic dXNlcjpwYXNz", "BearerToken", ""] {
            let req = TestRequest::default()
                .insert_header((header::AUTHORIZATION, value))
                .to_http_request();
            assert_eq!(extract_session_token(&req), None, "header: {:?}", value);
        }
    }

    #[test]
    fn session_cookie_is_http_only() {
        let cookie = session_cookie("t".to_string(), 604800, false);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(604800)));
    }

    #[test]
    fn removal_cookie_is_empty_and_expired() {
        let cookie = removal_cookie();
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }
}
