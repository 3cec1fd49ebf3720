//! Stateless HTTP request builder and response parser for the pet-post API.
//!
//! # Design
//! `PetClient` holds the base address, the authentication table and a
//! session snapshot, and carries no mutable state between calls. Each backend
//! operation is split into a `build_*` method that produces an `HttpRequest`
//! and a `parse_*` method that consumes an `HttpResponse`. Whoever sits in
//! between (a `Transport`, or the host across the C ABI) does the I/O.
//!
//! A builder that fails never produces a request, which is how a missing
//! token turns into `ApiError::Unauthenticated` without anything being sent.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{self, HttpMethod, HttpRequest, HttpResponse};
use crate::route::{Operation, Route};
use crate::session::Session;
use crate::types::{
    AuthRequest, NewPetPost, NewUser, PetPost, PetPostAndUser, PostStatus, RawObject,
    StatusUpdate, User, AVATAR_COUNT,
};

/// Field of the delete acknowledgement that counts removed documents.
pub const DELETED_COUNT_FIELD: &str = "deletedCount";

/// Synchronous, I/O-free client for the pet-post API.
#[derive(Debug, Clone)]
pub struct PetClient {
    config: ClientConfig,
    session: Session,
}

impl PetClient {
    pub fn new(config: ClientConfig, session: Session) -> Self {
        Self { config, session }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// A copy of this client bound to another session.
    pub fn with_session(&self, session: Session) -> Self {
        Self {
            config: self.config.clone(),
            session,
        }
    }

    pub fn build_list_posts(&self) -> Result<HttpRequest, ApiError> {
        self.request(Operation::ListPosts, HttpMethod::Get, Route::Posts, None, None)
    }

    pub fn build_latest_post(&self) -> Result<HttpRequest, ApiError> {
        self.request(Operation::LatestPost, HttpMethod::Get, Route::LatestPost, None, None)
    }

    pub fn build_get_user(&self, id: &str) -> Result<HttpRequest, ApiError> {
        let id = required_id(id)?;
        self.request(Operation::GetUser, HttpMethod::Get, Route::Users, Some(id), None)
    }

    pub fn build_create_user(&self, input: &NewUser) -> Result<HttpRequest, ApiError> {
        if input.avatar >= AVATAR_COUNT {
            return Err(ApiError::InvalidArgument(format!(
                "avatar {} is outside 0..{AVATAR_COUNT}",
                input.avatar
            )));
        }
        let body = encode(input)?;
        self.request(Operation::CreateUser, HttpMethod::Post, Route::Users, None, Some(body))
    }

    pub fn build_create_post(&self, input: &NewPetPost) -> Result<HttpRequest, ApiError> {
        let body = encode(input)?;
        self.request(Operation::CreatePost, HttpMethod::Post, Route::Posts, None, Some(body))
    }

    pub fn build_authenticate(&self, apple_id: &str) -> Result<HttpRequest, ApiError> {
        let body = encode(&AuthRequest {
            apple_id: apple_id.to_string(),
        })?;
        self.request(Operation::Authenticate, HttpMethod::Post, Route::Auth, None, Some(body))
    }

    /// GET `route[/id]` with the bearer token attached.
    pub fn build_get(&self, route: Route, id: Option<&str>) -> Result<HttpRequest, ApiError> {
        self.request(Operation::GenericGet, HttpMethod::Get, route, id, None)
    }

    /// POST any serializable payload to `route`.
    pub fn build_post<B: Serialize + ?Sized>(
        &self,
        route: Route,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        let body = encode(body)?;
        self.request(Operation::GenericPost, HttpMethod::Post, route, None, Some(body))
    }

    pub fn build_update_post_status(
        &self,
        id: &str,
        status: PostStatus,
    ) -> Result<HttpRequest, ApiError> {
        let id = required_id(id)?;
        let body = encode(&StatusUpdate { status })?;
        self.request(
            Operation::UpdatePostStatus,
            HttpMethod::Put,
            Route::Posts,
            Some(id),
            Some(body),
        )
    }

    pub fn build_delete_post(&self, id: &str) -> Result<HttpRequest, ApiError> {
        let id = required_id(id)?;
        self.request(Operation::DeletePost, HttpMethod::Delete, Route::Posts, Some(id), None)
    }

    pub fn parse_list_posts(&self, response: HttpResponse) -> Result<Vec<PetPost>, ApiError> {
        decode(response)
    }

    pub fn parse_latest_post(&self, response: HttpResponse) -> Result<PetPostAndUser, ApiError> {
        decode(response)
    }

    pub fn parse_get_user(&self, response: HttpResponse) -> Result<User, ApiError> {
        decode(response)
    }

    pub fn parse_create_user(&self, response: HttpResponse) -> Result<User, ApiError> {
        decode(response)
    }

    pub fn parse_create_post(&self, response: HttpResponse) -> Result<PetPost, ApiError> {
        decode(response)
    }

    pub fn parse_authenticate(&self, response: HttpResponse) -> Result<RawObject, ApiError> {
        decode(response)
    }

    pub fn parse_get(&self, response: HttpResponse) -> Result<RawObject, ApiError> {
        decode(response)
    }

    pub fn parse_post(&self, response: HttpResponse) -> Result<RawObject, ApiError> {
        decode(response)
    }

    pub fn parse_update_post_status(&self, response: HttpResponse) -> Result<PetPost, ApiError> {
        decode(response)
    }

    /// Succeeds only when the acknowledgement reports at least one removal.
    pub fn parse_delete_post(&self, response: HttpResponse) -> Result<RawObject, ApiError> {
        let ack: RawObject = decode(response)?;
        let count = ack
            .get(DELETED_COUNT_FIELD)
            .and_then(|value| value.as_u64())
            .ok_or_else(|| {
                ApiError::Decode(format!(
                    "delete acknowledgement has no numeric {DELETED_COUNT_FIELD:?}"
                ))
            })?;
        if count == 0 {
            return Err(ApiError::NothingDeleted);
        }
        Ok(ack)
    }

    fn request(
        &self,
        operation: Operation,
        method: HttpMethod,
        route: Route,
        id: Option<&str>,
        body: Option<String>,
    ) -> Result<HttpRequest, ApiError> {
        let mut headers = if body.is_some() {
            http::json_headers()
        } else {
            Vec::new()
        };
        if self.config.auth.requires(operation) {
            let token = self
                .session
                .token()
                .ok_or(ApiError::Unauthenticated { operation })?;
            headers.push((http::AUTHORIZATION.to_string(), format!("Bearer {token}")));
        }
        let url = route.url(&self.config.base_url, id)?;
        Ok(HttpRequest {
            method,
            url: url.into(),
            headers,
            body,
        })
    }
}

/// Reject an empty id where the route would otherwise fall back to the
/// whole collection.
fn required_id(id: &str) -> Result<&str, ApiError> {
    if id.is_empty() {
        return Err(ApiError::InvalidArgument("id must not be empty".to_string()));
    }
    Ok(id)
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Result<String, ApiError> {
    serde_json::to_string(body).map_err(ApiError::encode)
}

/// Check the status, then decode the body as `T`.
fn decode<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(ApiError::decode)
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}
