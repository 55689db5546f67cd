use async_trait::async_trait;
use serde::Deserialize;

use fetchgate_core::error::GatewayError;

/// External challenge check: a token either passes or it does not.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<bool, GatewayError>;
}

/// Verifier backed by an HTTPS endpoint answering `{"success": bool}`.
///
/// The token and the shared secret travel as query parameters on a POST.
pub struct HttpVerifier {
    client: reqwest::Client,
    endpoint: String,
    secret: String,
}

impl HttpVerifier {
    pub fn new(client: reqwest::Client, endpoint: String, secret: String) -> Self {
        Self {
            client,
            endpoint,
            secret,
        }
    }
}

#[derive(Deserialize)]
struct VerifyResponse {
    /// Absent from the body counts as a rejection.
    #[serde(default)]
    success: bool,
}

#[async_trait]
impl TokenVerifier for HttpVerifier {
    async fn verify(&self, token: &str) -> Result<bool, GatewayError> {
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("secret", self.secret.as_str()), ("response", token)])
            .send()
            .await?
            .error_for_status()?;
        let body: VerifyResponse = response.json().await?;
        log::info!("[verify] challenge result: success={}", body.success);
        Ok(body.success)
    }
}
