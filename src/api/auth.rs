use crate::gateway::{ApiGateway, ApiRequest};
use crate::outcome::Outcome;

use super::models::{LoginResponse, UserData};
use super::validation::Credentials;

#[derive(Clone)]
pub struct AuthApi {
    gateway: ApiGateway,
}

impl AuthApi {
    pub fn new(gateway: ApiGateway) -> Self {
        Self { gateway }
    }

    /// `POST /auth/login`. The server answers with the session cookie.
    pub async fn login(&self, credentials: &Credentials) -> Outcome<LoginResponse> {
        let req = ApiRequest::post("/auth/login").json(credentials.to_json());
        self.gateway.request(req).await
    }

    pub async fn logout(&self) -> Outcome<()> {
        self.gateway.execute(ApiRequest::post("/auth/logout")).await
    }

    pub async fn register(&self, credentials: &Credentials) -> Outcome<()> {
        let req = ApiRequest::post("/auth/register").json(credentials.to_json());
        self.gateway.execute(req).await
    }

    /// `GET /auth/token_data`: what the server thinks the session cookie says.
    pub async fn token_data(&self) -> Outcome<UserData> {
        self.gateway.request(ApiRequest::get("/auth/token_data")).await
    }
}
