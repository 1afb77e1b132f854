use anyhow::{Result, bail};
use binwatch_core::api::{
    AuthResponse, DashboardResponse, LoginRequest, MessageResponse, RewardPointsResponse,
};
use binwatch_core::overview::AuthorityOverview;
use binwatch_core::{PickupRequestId, PickupRequestView};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

/// Thin client for the binwatch HTTP API holding the session token after login.
pub(crate) struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub(crate) fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            token: None,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    pub(crate) async fn login(&mut self, email: &str, password: &str) -> Result<AuthResponse> {
        let req = self.http.post(self.url("/api/auth/login")).json(&LoginRequest {
            email: email.to_owned(),
            password: password.to_owned(),
        });
        let response: AuthResponse = fetch_json(req).await?;
        self.token = Some(response.token.clone());
        Ok(response)
    }

    pub(crate) fn logout(&mut self) {
        self.token = None;
    }

    pub(crate) async fn dashboard(&self) -> Result<DashboardResponse> {
        fetch_json(self.authorized(self.http.get(self.url("/api/user/waste-levels")))).await
    }

    pub(crate) async fn calculate_rewards(&self) -> Result<RewardPointsResponse> {
        fetch_json(self.authorized(self.http.get(self.url("/api/rewards/points")))).await
    }

    pub(crate) async fn overview(&self) -> Result<AuthorityOverview> {
        fetch_json(self.authorized(self.http.get(self.url("/api/authority/overview")))).await
    }

    pub(crate) async fn pickup_requests(&self) -> Result<Vec<PickupRequestView>> {
        fetch_json(self.authorized(self.http.get(self.url("/api/pickup-requests")))).await
    }

    pub(crate) async fn accept_pickup(&self, id: PickupRequestId) -> Result<MessageResponse> {
        let path = format!("/api/pickup-requests/{id}/accept");
        fetch_json(self.authorized(self.http.patch(self.url(&path)))).await
    }
}

async fn fetch_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T> {
    let resp = req.send().await?;
    let status = resp.status();
    if !status.is_success() {
        // The API reports failures as `{"message": ...}`.
        let message = resp
            .json::<MessageResponse>()
            .await
            .map_or_else(|_err| status.to_string(), |body| body.message);
        bail!(message);
    }
    Ok(resp.json().await?)
}
