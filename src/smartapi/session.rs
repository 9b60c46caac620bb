use crate::smartapi::config;
use crate::smartapi::models::{ApiEnvelope, LoginData, LoginRequest};
use crate::smartapi::totp;
use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use reqwest::{header, Client};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info};

/// SmartAPI credentials, loaded once from the environment.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_key: String,
    pub client_id: String,
    pub pin: String,
    pub totp_secret: String,
}

// -----------------------------------------------
// AUTHENTICATED SESSION (one per pipeline run)
// -----------------------------------------------

/// A single-use SmartAPI session: build, login once, issue bearer-authorized
/// calls, discard. TOTP codes are not reusable across windows, so sessions
/// are never carried over between runs.
pub struct QuoteSession {
    client: Client,
    credentials: Credentials,
    jwt: Option<String>,
}

impl QuoteSession {
    pub fn new(credentials: Credentials) -> Result<Self> {
        Ok(Self {
            client: build_client(&credentials.api_key)?,
            credentials,
            jwt: None,
        })
    }

    /// Exchange client id + PIN + a freshly derived TOTP code for a bearer
    /// token. Returns false on any failure; the cause is logged here and the
    /// caller decides whether that is fatal. Never retries.
    pub async fn login(&mut self) -> bool {
        match self.try_login().await {
            Ok(()) => {
                info!(client = %self.credentials.client_id, "SmartAPI login successful");
                true
            }
            Err(e) => {
                error!(error = %e, "SmartAPI login failed");
                false
            }
        }
    }

    async fn try_login(&mut self) -> Result<()> {
        let code = totp::generate_code(&self.credentials.totp_secret, Utc::now().timestamp() as u64)?;
        debug!("derived TOTP code for login");

        let body = LoginRequest {
            clientcode: &self.credentials.client_id,
            password: &self.credentials.pin,
            totp: &code,
        };

        let response = self
            .client
            .post(format!("{}{}", config::SMARTAPI_BASE_URL, config::LOGIN_PATH))
            .json(&body)
            .send()
            .await
            .context("login request failed")?;

        let envelope: ApiEnvelope<LoginData> = response
            .json()
            .await
            .context("malformed login response")?;

        if !envelope.status {
            bail!("login rejected: {}", envelope.failure_reason());
        }

        let jwt = envelope
            .data
            .and_then(|d| d.jwt_token)
            .ok_or_else(|| anyhow!("login response missing jwtToken"))?;

        self.jwt = Some(jwt);
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.jwt.is_some()
    }

    /// Bearer-authorized POST returning the raw JSON body. Errors on
    /// transport failure, non-2xx status, or a non-JSON body; interpreting
    /// the envelope is the caller's job.
    pub async fn post_authed<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        let jwt = self
            .jwt
            .as_ref()
            .ok_or_else(|| anyhow!("session is not authenticated"))?;

        let response = self
            .client
            .post(format!("{}{}", config::SMARTAPI_BASE_URL, path))
            .bearer_auth(jwt)
            .json(body)
            .send()
            .await
            .with_context(|| format!("request to {} failed", path))?;

        let status = response.status();
        if !status.is_success() {
            bail!("HTTP {} from {}", status, path);
        }

        response
            .json::<Value>()
            .await
            .with_context(|| format!("non-JSON response from {}", path))
    }
}

// -----------------------------------------------
// HTTP CLIENT BUILDER
// -----------------------------------------------

fn build_client(api_key: &str) -> Result<Client> {
    let mut headers = header::HeaderMap::new();

    headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));
    headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
    headers.insert("X-UserType", header::HeaderValue::from_static(config::HEADER_USER_TYPE));
    headers.insert("X-SourceID", header::HeaderValue::from_static(config::HEADER_SOURCE_ID));
    headers.insert(
        "X-ClientLocalIP",
        header::HeaderValue::from_static(config::HEADER_CLIENT_LOCAL_IP),
    );
    headers.insert(
        "X-ClientPublicIP",
        header::HeaderValue::from_static(config::HEADER_CLIENT_PUBLIC_IP),
    );
    headers.insert(
        "X-MACAddress",
        header::HeaderValue::from_static(config::HEADER_MAC_ADDRESS),
    );
    headers.insert(
        "X-PrivateKey",
        header::HeaderValue::from_str(api_key).context("API key is not a valid header value")?,
    );

    Client::builder()
        .default_headers(headers)
        .timeout(config::HTTP_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}
