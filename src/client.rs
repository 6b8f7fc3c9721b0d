//! Typed client for the REST surface.
//!
//! The client holds the bearer token. Signup and login set it; `logout` or
//! any 401 response clears it, after which the caller is expected to send
//! the user back to the login screen.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    auth::dto::{AuthResponse, LoginRequest, SignupRequest},
    board::TaskApi,
    error::MessageBody,
    projects::{dto::CreateProjectRequest, Project},
    tasks::{dto::CreateTaskRequest, Task, TaskPatch},
    users::User,
};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("could not decode response: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized(_))
    }
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    /// `base_url` is the API root, e.g. `http://localhost:7000/api/v1`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        }
    }

    pub fn with_token(self, token: impl Into<String>) -> Self {
        self.set_token(Some(token.into()));
        self
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn logout(&self) {
        self.set_token(None);
    }

    fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self.http.request(method, format!("{}{}", self.base_url, path));
        match self.token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let res = req.send().await?;
        self.decode(res).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send(req.json(body)).await
    }

    async fn decode<T: DeserializeOwned>(&self, res: Response) -> Result<T, ClientError> {
        let status = res.status();
        if status.is_success() {
            return res
                .json::<T>()
                .await
                .map_err(|e| ClientError::Decode(e.to_string()));
        }

        let message = match res.json::<MessageBody>().await {
            Ok(body) => body.message,
            Err(_) => status.to_string(),
        };
        debug!(%status, %message, "api error");
        Err(match status {
            StatusCode::UNAUTHORIZED => {
                warn!("unauthorized response; dropping token");
                self.logout();
                ClientError::Unauthorized(message)
            }
            StatusCode::BAD_REQUEST => ClientError::Validation(message),
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            _ => ClientError::Server {
                status: status.as_u16(),
                message,
            },
        })
    }

    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ClientError> {
        let body = SignupRequest {
            name: Some(name.into()),
            email: Some(email.into()),
            password: Some(password.into()),
        };
        let auth: AuthResponse = self
            .send_json(self.request(Method::POST, "/auth/signup"), &body)
            .await?;
        self.set_token(Some(auth.token.clone()));
        Ok(auth)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let body = LoginRequest {
            email: Some(email.into()),
            password: Some(password.into()),
        };
        let auth: AuthResponse = self
            .send_json(self.request(Method::POST, "/auth/login"), &body)
            .await?;
        self.set_token(Some(auth.token.clone()));
        Ok(auth)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ClientError> {
        self.send(self.request(Method::GET, "/users")).await
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>, ClientError> {
        self.send(self.request(Method::GET, "/projects")).await
    }

    pub async fn create_project(
        &self,
        project: &CreateProjectRequest,
    ) -> Result<Project, ClientError> {
        self.send_json(self.request(Method::POST, "/projects"), project)
            .await
    }

    pub async fn get_project(&self, id: Uuid) -> Result<Project, ClientError> {
        self.send(self.request(Method::GET, &format!("/projects/{id}")))
            .await
    }

    pub async fn delete_project(&self, id: Uuid) -> Result<MessageBody, ClientError> {
        self.send(self.request(Method::DELETE, &format!("/projects/{id}")))
            .await
    }
}

#[async_trait]
impl TaskApi for ApiClient {
    async fn list_tasks(&self, project_id: Uuid) -> Result<Vec<Task>, ClientError> {
        self.send(self.request(Method::GET, &format!("/projects/{project_id}/tasks")))
            .await
    }

    async fn create_task(
        &self,
        project_id: Uuid,
        draft: &CreateTaskRequest,
    ) -> Result<Task, ClientError> {
        self.send_json(
            self.request(Method::POST, &format!("/projects/{project_id}/tasks")),
            draft,
        )
        .await
    }

    async fn update_task(&self, id: Uuid, patch: &TaskPatch) -> Result<Task, ClientError> {
        self.send_json(self.request(Method::PUT, &format!("/tasks/{id}")), patch)
            .await
    }

    async fn delete_task(&self, id: Uuid) -> Result<(), ClientError> {
        let _: MessageBody = self
            .send(self.request(Method::DELETE, &format!("/tasks/{id}")))
            .await?;
        Ok(())
    }
}
