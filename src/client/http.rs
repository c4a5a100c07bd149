use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use super::{AttemptApi, ClientError, ClientResult};
use crate::dto::{
    attempt::{AttemptView, CreateAttemptRequest, CreateAttemptResponse},
    auth::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse},
    dashboard::DashboardResponse,
    error::ErrorBody,
    leaderboard::{LeaderboardEntry, TotalTimeEntry},
};

/// HTTP client for the plank service JSON API.
#[derive(Clone)]
pub struct PlankClient {
    client: Client,
    base_url: Arc<str>,
    token: Option<Arc<str>>,
}

impl PlankClient {
    /// Build an anonymous client for the service at `base_url`.
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| ClientError::ClientBuilder { source })?;

        Ok(Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            token: None,
        })
    }

    /// Same client, authenticating every request with the session `token`.
    pub fn with_token(self, token: impl Into<Arc<str>>) -> Self {
        Self {
            token: Some(token.into()),
            ..self
        }
    }

    /// Create an account. Does not sign in.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> ClientResult<RegisterResponse> {
        let body = RegisterRequest {
            email: Some(email.to_owned()),
            password: Some(password.to_owned()),
            display_name: Some(display_name.to_owned()),
        };
        self.post("/api/auth/register", &body).await
    }

    /// Open a session. Pass the returned token to [`PlankClient::with_token`].
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<LoginResponse> {
        let body = LoginRequest {
            email: Some(email.to_owned()),
            password: Some(password.to_owned()),
        };
        self.post("/api/auth/login", &body).await
    }

    /// Revoke the current session.
    pub async fn logout(&self) -> ClientResult<()> {
        let path = "/api/auth/logout";
        let response = self.send(path, self.request(Method::POST, path)).await?;
        Self::check(path, response).await.map(drop)
    }

    /// Log an attempt for the signed-in user.
    pub async fn create_attempt(
        &self,
        request: CreateAttemptRequest,
    ) -> ClientResult<CreateAttemptResponse> {
        self.post("/api/attempts", &request).await
    }

    /// The caller's attempts, newest first.
    pub async fn list_attempts(&self) -> ClientResult<Vec<AttemptView>> {
        self.get("/api/attempts", None).await
    }

    /// Ranking by personal best.
    pub async fn leaderboard(&self) -> ClientResult<Vec<LeaderboardEntry>> {
        self.get("/api/leaderboard", None).await
    }

    /// Ranking by cumulative time in `year` (the current year when `None`).
    pub async fn total_leaderboard(&self, year: Option<i32>) -> ClientResult<Vec<TotalTimeEntry>> {
        self.get("/api/leaderboard/total", year.map(|year| ("year", year)))
            .await
    }

    /// Summary shown on the landing page.
    pub async fn dashboard(&self) -> ClientResult<DashboardResponse> {
        self.get("/api/dashboard", None).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match self.token {
            Some(ref token) => builder.bearer_auth(token.as_ref()),
            None => builder,
        }
    }

    async fn get<T>(&self, path: &str, query: Option<(&str, i32)>) -> ClientResult<T>
    where
        T: DeserializeOwned,
    {
        let mut builder = self.request(Method::GET, path);
        if let Some(pair) = query {
            builder = builder.query(&[pair]);
        }
        self.execute(path, builder).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: ?Sized + Serialize,
        T: DeserializeOwned,
    {
        self.execute(path, self.request(Method::POST, path).json(body))
            .await
    }

    async fn execute<T>(&self, path: &str, builder: RequestBuilder) -> ClientResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self.send(path, builder).await?;
        Self::check(path, response)
            .await?
            .json::<T>()
            .await
            .map_err(|source| ClientError::DecodeResponse {
                path: path.to_owned(),
                source,
            })
    }

    async fn send(&self, path: &str, builder: RequestBuilder) -> ClientResult<Response> {
        debug!(path, "sending request");
        builder
            .send()
            .await
            .map_err(|source| ClientError::RequestSend {
                path: path.to_owned(),
                source,
            })
    }

    /// Turn a non-success status into [`ClientError::Rejected`], keeping the body's reason.
    async fn check(path: &str, response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .map(|body| body.error);
        Err(ClientError::Rejected {
            path: path.to_owned(),
            status,
            message,
        })
    }
}

impl AttemptApi for PlankClient {
    fn create_attempt(
        &self,
        request: CreateAttemptRequest,
    ) -> BoxFuture<'static, ClientResult<CreateAttemptResponse>> {
        let client = self.clone();
        Box::pin(async move { PlankClient::create_attempt(&client, request).await })
    }
}
