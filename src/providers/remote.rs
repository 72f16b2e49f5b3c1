//! JSON-over-HTTPS provider backed by the hosted wallet API.

use super::{ConnectedWallet, WalletProvider};
use crate::error::{MundoError, MundoResult};
use crate::wizard::CancelToken;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = "MundoFi/1.0";

pub struct RemoteWalletProvider {
    client: Client,
    base_url: Url,
    project_id: Option<String>,
    /// Bearer token handed out by a successful code verification
    access_token: Mutex<Option<String>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendCodeRequest<'a> {
    email: &'a str,
    project_id: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyCodeRequest<'a> {
    email: &'a str,
    otp: &'a str,
    project_id: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyCodeResponse {
    access_token: Option<String>,
}

#[derive(Deserialize)]
struct AddressResponse {
    address: Option<String>,
}

impl RemoteWalletProvider {
    /// `base_url` must be an https URL
    pub fn new(base_url: &str, project_id: Option<String>) -> MundoResult<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.scheme() != "https" {
            return Err(MundoError::config_error("Remote provider requires an https base URL"));
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| MundoError::network_error(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            project_id,
            access_token: Mutex::new(None),
        })
    }

    fn endpoint(&self, path: &str) -> MundoResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn bearer(&self) -> MundoResult<Option<String>> {
        Ok(self
            .access_token
            .lock()
            .map_err(|_| MundoError::internal("Token lock poisoned"))?
            .clone())
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> MundoResult<reqwest::Response> {
        let url = self.endpoint(path)?;
        let response = self.client.post(url).json(body).send().await?;
        check_status(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> MundoResult<T> {
        let url = self.endpoint(path)?;
        let mut request = self.client.get(url);
        if let Some(token) = self.bearer()? {
            request = request.bearer_auth(token);
        }
        let response = check_status(request.send().await?).await?;
        Ok(response.json::<T>().await?)
    }
}

async fn check_status(response: reqwest::Response) -> MundoResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(MundoError::operation_failed(format!("Wallet API returned {}", status.as_u16()))
        .with_details(body.chars().take(200).collect::<String>()))
}

/// Race a request against the wizard's cancel token
async fn cancellable<T>(
    cancel: &CancelToken,
    request: impl Future<Output = MundoResult<T>>,
) -> MundoResult<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(MundoError::cancelled("Request cancelled")),
        result = request => result,
    }
}

#[async_trait]
impl WalletProvider for RemoteWalletProvider {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn send_verification_code(&self, email: &str, cancel: &CancelToken) -> MundoResult<()> {
        let body = SendCodeRequest {
            email,
            project_id: self.project_id.as_deref(),
        };
        cancellable(cancel, self.post_json("v1/auth/email/send", &body)).await?;
        Ok(())
    }

    async fn verify_code(&self, email: &str, code: &str, cancel: &CancelToken) -> MundoResult<()> {
        let body = VerifyCodeRequest {
            email,
            otp: code,
            project_id: self.project_id.as_deref(),
        };
        let verified: VerifyCodeResponse = cancellable(cancel, async {
            let response = self.post_json("v1/auth/email/verify", &body).await?;
            Ok(response.json::<VerifyCodeResponse>().await?)
        })
        .await?;

        if let Some(token) = verified.access_token {
            *self
                .access_token
                .lock()
                .map_err(|_| MundoError::internal("Token lock poisoned"))? = Some(token);
        }
        Ok(())
    }

    async fn connect_external_wallet(&self, cancel: &CancelToken) -> MundoResult<ConnectedWallet> {
        cancellable(cancel, async {
            let response = self.post_json("v1/wallet/connect", &serde_json::json!({})).await?;
            Ok(response.json::<ConnectedWallet>().await?)
        })
        .await
    }

    async fn resolve_own_address(&self, cancel: &CancelToken) -> MundoResult<Option<String>> {
        if self.bearer()?.is_none() {
            return Ok(None);
        }
        let response: AddressResponse =
            cancellable(cancel, self.get_json("v1/wallet/address")).await?;
        Ok(response.address)
    }
}
