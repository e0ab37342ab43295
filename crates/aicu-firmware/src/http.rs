//! HTTPS access to the Aicuflow backend.
//!
//! [`BackendClient`] owns the TLS and response buffers and issues JSON POSTs
//! over the embassy-net stack. It backs both the login performed by the
//! connection task and the [`HttpTransport`] used by the delivery task.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use aicu_core::api::{self, LoginRequest};
use aicu_core::app_state::{AppError, short_message};
use aicu_core::pipeline::{DeliveryError, DeliveryTarget, Transport};
use embassy_net::Stack;
use embassy_net::dns::DnsSocket;
use embassy_net::tcp::client::{TcpClient, TcpClientState};
use embassy_time::{Duration, with_timeout};
use log::{debug, warn};
use reqwless::client::{HttpClient, TlsConfig, TlsVerify};
use reqwless::request::{Method, RequestBuilder};
use thiserror_no_std::Error;

use crate::debug_message;
use crate::net::SESSION;

const TLS_READ_BUFFER_LEN: usize = 16_640;
const TLS_WRITE_BUFFER_LEN: usize = 4_096;
const RESPONSE_BUFFER_LEN: usize = 4_096;

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Request timed out")]
    Timeout,
    #[error("Request failed: {0:?}")]
    Request(reqwless::Error),
}

impl From<reqwless::Error> for HttpError {
    fn from(error: reqwless::Error) -> Self {
        HttpError::Request(error)
    }
}

pub struct BackendClient {
    stack: Stack<'static>,
    base_url: &'static str,
    seed: u64,
    tls_read: Vec<u8>,
    tls_write: Vec<u8>,
    response: Vec<u8>,
}

impl BackendClient {
    pub fn new(stack: Stack<'static>, base_url: &'static str, seed: u64) -> Self {
        Self {
            stack,
            base_url,
            seed,
            tls_read: vec![0; TLS_READ_BUFFER_LEN],
            tls_write: vec![0; TLS_WRITE_BUFFER_LEN],
            response: vec![0; RESPONSE_BUFFER_LEN],
        }
    }

    /// POST a JSON body to `path`. Returns the status code and the response
    /// body.
    pub async fn post_json(
        &mut self,
        path: &str,
        body: &[u8],
        token: Option<&str>,
    ) -> Result<(u16, Vec<u8>), HttpError> {
        let timeout = Duration::from_millis(api::HTTP_TIMEOUT_MS);
        with_timeout(timeout, self.post_inner(path, body, token))
            .await
            .map_err(|_| HttpError::Timeout)?
    }

    async fn post_inner(
        &mut self,
        path: &str,
        body: &[u8],
        token: Option<&str>,
    ) -> Result<(u16, Vec<u8>), HttpError> {
        let url = api::url(self.base_url, path);
        // fresh TLS randomness per connection
        self.seed = self.seed.wrapping_mul(6364136223846793005).wrapping_add(1);

        let state = TcpClientState::<1, 1024, 1024>::new();
        let tcp = TcpClient::new(self.stack, &state);
        let dns = DnsSocket::new(self.stack);
        let tls = TlsConfig::new(self.seed, &mut self.tls_read, &mut self.tls_write, TlsVerify::None);
        let mut client = HttpClient::new_with_tls(&tcp, &dns, tls);

        let authorization = token.map(api::bearer).unwrap_or_default();
        let mut headers: heapless::Vec<(&str, &str), 2> = heapless::Vec::new();
        let _ = headers.push(("Content-Type", "application/json"));
        if token.is_some() {
            let _ = headers.push(("Authorization", authorization.as_str()));
        }

        debug!("POST {} ({} bytes)", url, body.len());
        let request = client.request(Method::POST, &url).await?;
        let mut request = request.headers(&headers[..]).body(body);
        let response = request.send(&mut self.response).await?;
        let status = response.status.0;
        let payload = response.body().read_to_end().await?;
        Ok((status, Vec::from(&*payload)))
    }

    /// Log in and return the access token.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<String, AppError> {
        let payload = LoginRequest::new(email, password).to_json()?;
        let (status, body) = self
            .post_json(api::LOGIN_PATH, &payload, None)
            .await
            .map_err(|e| AppError::Login(debug_message(&e)))?;
        if !api::is_success(status) {
            warn!("Login rejected with status {}", status);
            return Err(AppError::Login(short_message(&status)));
        }
        api::parse_access_token(&body)
    }
}

/// Batch transport posting to the write-values endpoint with the current
/// session token.
pub struct HttpTransport {
    client: BackendClient,
}

impl HttpTransport {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    type Error = DeliveryError;

    async fn send_batch(&mut self, target: &DeliveryTarget, body: &[u8]) -> Result<(), DeliveryError> {
        let Some(token) = SESSION.lock().await.clone() else {
            return Err(DeliveryError::Unauthorized);
        };

        let path = api::write_values_path(target);
        let (status, _) = self
            .client
            .post_json(&path, body, Some(&token))
            .await
            .map_err(|e| {
                warn!("{}", e);
                DeliveryError::Connection
            })?;

        match status {
            s if api::is_success(s) => Ok(()),
            401 | 403 => Err(DeliveryError::Unauthorized),
            s => Err(DeliveryError::Status(s)),
        }
    }
}
