// src/api.rs
//! Aicuflow backend request model.
//!
//! Only the pieces both transports need: paths, the login payload, token
//! extraction and the write-values query. The HTTP client itself lives in the
//! firmware crate.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use core::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::app_state::{AppError, short_message};
use crate::pipeline::DeliveryTarget;

pub const LOGIN_PATH: &str = "/user/auth/login/";
pub const WRITE_VALUES_PATH: &str = "/data/write-values/";

/// Applied to every backend request
pub const HTTP_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub keep_me_logged_in: bool,
}

impl<'a> LoginRequest<'a> {
    pub fn new(email: &'a str, password: &'a str) -> Self {
        Self {
            email,
            password,
            keep_me_logged_in: true,
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, AppError> {
        serde_json::to_vec(self).map_err(|e| AppError::Login(short_message(&e)))
    }
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(default)]
    data: Option<LoginData>,
}

#[derive(Deserialize)]
struct LoginData {
    #[serde(default)]
    accesstoken: Option<String>,
}

/// Pull `data.accesstoken` out of a login response body.
pub fn parse_access_token(body: &[u8]) -> Result<String, AppError> {
    let response: LoginResponse =
        serde_json::from_slice(body).map_err(|e| AppError::Login(short_message(&e)))?;
    match response.data.and_then(|d| d.accesstoken) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AppError::Login(short_message(&"token missing in login response"))),
    }
}

/// Value of the `Authorization` header.
pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Join the base URL and an absolute path.
pub fn url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Path and query for posting one batch.
pub fn write_values_path(target: &DeliveryTarget) -> String {
    let mut path = String::from(WRITE_VALUES_PATH);
    path.push_str("?flow=");
    percent_encode(&mut path, &target.flow_id);
    path.push_str("&filename=");
    percent_encode(&mut path, &target.filename);
    path
}

pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Append `value` with everything but RFC 3986 unreserved bytes escaped.
fn percent_encode(out: &mut String, value: &str) {
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => out.push(byte as char),
            // writing into a String cannot fail
            _ => {
                let _ = write!(out, "%{:02X}", byte);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_payload() {
        let body = LoginRequest::new("me@example.com", "pw").to_json().unwrap();
        assert_eq!(
            core::str::from_utf8(&body).unwrap(),
            r#"{"email":"me@example.com","password":"pw","keep_me_logged_in":true}"#
        );
    }

    #[test]
    fn test_token_extraction() {
        let body = br#"{"status":"ok","data":{"accesstoken":"abc.def","user":{}}}"#;
        assert_eq!(parse_access_token(body).unwrap(), "abc.def");
        assert_eq!(bearer("abc.def"), "Bearer abc.def");
    }

    #[test]
    fn test_missing_or_empty_token_is_login_error() {
        for body in [&br#"{"data":{"accesstoken":""}}"#[..], br#"{"data":{}}"#, br#"{}"#, b"not json"] {
            assert!(matches!(parse_access_token(body), Err(AppError::Login(_))));
        }
    }

    #[test]
    fn test_write_values_path_escapes_query() {
        let target = DeliveryTarget::new("f-1", "my data&more");
        assert_eq!(
            write_values_path(&target),
            "/data/write-values/?flow=f-1&filename=my%20data%26more"
        );
    }

    #[test]
    fn test_url_join_and_status() {
        assert_eq!(url("https://host/", LOGIN_PATH), "https://host/user/auth/login/");
        assert!(is_success(201));
        assert!(!is_success(401));
    }
}
