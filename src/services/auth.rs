use actix_web::http::header::AUTHORIZATION;
use actix_web::HttpRequest;

use base64::prelude::*;

/// Email and password from an `Authorization: Basic ...` header.
pub struct Credentials {
    pub email: String,
    pub password: String,
}

pub fn basic_credentials(request: &HttpRequest) -> Option<Credentials> {
    let header = request.headers().get(AUTHORIZATION)?.to_str().ok()?;

    parse_basic_auth_header(header)
}

fn parse_basic_auth_header(header: &str) -> Option<Credentials> {
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = BASE64_STANDARD.decode(encoded.trim().as_bytes()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;

    let mut parts = decoded.splitn(2, ':');
    let email = parts.next()?;
    let password = parts.next()?;

    Some(Credentials {
        email: email.into(),
        password: password.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_auth_valid() {
        // "user:pass" in base64 = "dXNlcjpwYXNz"
        let credentials = parse_basic_auth_header("Basic dXNlcjpwYXNz").unwrap();
        assert_eq!(credentials.email, "user");
        assert_eq!(credentials.password, "pass");
    }

    #[test]
    fn test_parse_basic_auth_with_colon_in_password() {
        // "admin:p@ss:word" in base64 = "YWRtaW46cEBzczp3b3Jk"
        let credentials = parse_basic_auth_header("Basic YWRtaW46cEBzczp3b3Jk").unwrap();
        assert_eq!(credentials.email, "admin");
        assert_eq!(credentials.password, "p@ss:word");
    }

    #[test]
    fn test_parse_basic_auth_rejects_bad_headers() {
        assert!(parse_basic_auth_header("dXNlcjpwYXNz").is_none());
        assert!(parse_basic_auth_header("Basic !!invalid!!").is_none());
        // "userpass" in base64, no colon
        assert!(parse_basic_auth_header("Basic dXNlcnBhc3M=").is_none());
    }
}
