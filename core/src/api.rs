//! Async façade: one future per backend operation.
//!
//! # Design
//! `PetApi` pairs a `PetClient` with a `Transport`. Every method builds the
//! request, sends it once and parses the response, so the returned future
//! resolves exactly once to the typed result or an `ApiError`. Methods take
//! `&self` and share nothing mutable, so concurrent calls never wait on each
//! other. Callers that own a UI thread hop back onto it themselves.

use serde::Serialize;
use tracing::{debug, warn};

use crate::client::PetClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::route::Route;
use crate::session::Session;
use crate::transport::Transport;
use crate::types::{NewPetPost, NewUser, PetPost, PetPostAndUser, PostStatus, RawObject, User};

#[derive(Debug, Clone)]
pub struct PetApi<T> {
    client: PetClient,
    transport: T,
}

impl<T: Transport> PetApi<T> {
    pub fn new(client: PetClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &PetClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Rebind to `session`, keeping the transport.
    pub fn with_session(self, session: Session) -> Self {
        Self {
            client: self.client.with_session(session),
            transport: self.transport,
        }
    }

    pub async fn list_posts(&self) -> Result<Vec<PetPost>, ApiError> {
        let response = self.execute(self.client.build_list_posts()).await?;
        self.client.parse_list_posts(response)
    }

    pub async fn latest_post(&self) -> Result<PetPostAndUser, ApiError> {
        let response = self.execute(self.client.build_latest_post()).await?;
        self.client.parse_latest_post(response)
    }

    pub async fn get_user(&self, id: &str) -> Result<User, ApiError> {
        let response = self.execute(self.client.build_get_user(id)).await?;
        self.client.parse_get_user(response)
    }

    pub async fn create_user(&self, input: &NewUser) -> Result<User, ApiError> {
        let response = self.execute(self.client.build_create_user(input)).await?;
        self.client.parse_create_user(response)
    }

    pub async fn create_post(&self, input: &NewPetPost) -> Result<PetPost, ApiError> {
        let response = self.execute(self.client.build_create_post(input)).await?;
        self.client.parse_create_post(response)
    }

    pub async fn authenticate(&self, apple_id: &str) -> Result<RawObject, ApiError> {
        let response = self.execute(self.client.build_authenticate(apple_id)).await?;
        self.client.parse_authenticate(response)
    }

    /// Authenticate and turn the response into a `Session`. Persisting it is
    /// up to the caller.
    pub async fn authenticate_session(&self, apple_id: &str) -> Result<Session, ApiError> {
        let response = self.authenticate(apple_id).await?;
        Session::from_auth_response(&response)
    }

    pub async fn get(&self, route: Route, id: Option<&str>) -> Result<RawObject, ApiError> {
        let response = self.execute(self.client.build_get(route, id)).await?;
        self.client.parse_get(response)
    }

    pub async fn post<B: Serialize + Sync + ?Sized>(
        &self,
        route: Route,
        body: &B,
    ) -> Result<RawObject, ApiError> {
        let response = self.execute(self.client.build_post(route, body)).await?;
        self.client.parse_post(response)
    }

    pub async fn update_post_status(
        &self,
        id: &str,
        status: PostStatus,
    ) -> Result<PetPost, ApiError> {
        let response = self
            .execute(self.client.build_update_post_status(id, status))
            .await?;
        self.client.parse_update_post_status(response)
    }

    pub async fn delete_post(&self, id: &str) -> Result<RawObject, ApiError> {
        let response = self.execute(self.client.build_delete_post(id)).await?;
        self.client.parse_delete_post(response)
    }

    async fn execute(
        &self,
        request: Result<HttpRequest, ApiError>,
    ) -> Result<HttpResponse, ApiError> {
        let request = request.inspect_err(|e| warn!(error = %e, "request not sent"))?;
        let method = request.method;
        let url = request.url.clone();
        debug!(%method, %url, "sending request");

        match self.transport.send(request).await {
            Ok(response) => {
                debug!(%method, %url, status = response.status, "response received");
                Ok(response)
            }
            Err(e) => {
                warn!(%method, %url, error = %e, "request failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::config::ClientConfig;
    use crate::route::Operation;

    /// Records every request and answers with a canned response.
    struct Recording {
        sent: Mutex<Vec<HttpRequest>>,
        reply: HttpResponse,
    }

    #[async_trait]
    impl Transport for Recording {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.sent.lock().unwrap().push(request);
            Ok(self.reply.clone())
        }
    }

    fn api(session: Session, reply: HttpResponse) -> PetApi<Recording> {
        let config = ClientConfig::new("http://stub.local").unwrap();
        PetApi::new(
            PetClient::new(config, session),
            Recording {
                sent: Mutex::new(Vec::new()),
                reply,
            },
        )
    }

    #[tokio::test]
    async fn authenticate_session_extracts_token() {
        let api = api(
            Session::anonymous(),
            HttpResponse::new(200, r#"{"token":"jwt.1"}"#),
        );
        let session = api.authenticate_session("apple.1").await.unwrap();
        assert_eq!(session.token(), Some("jwt.1"));

        let api = api.with_session(session);
        api.get(Route::Users, Some("u1")).await.unwrap();
        let sent = api.transport().sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].header("authorization"), Some("Bearer jwt.1"));
    }

    #[tokio::test]
    async fn generic_get_without_token_sends_nothing() {
        let api = api(Session::anonymous(), HttpResponse::new(200, "{}"));
        let err = api.get(Route::Posts, None).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Unauthenticated {
                operation: Operation::GenericGet
            }
        ));
        assert!(api.transport().sent.lock().unwrap().is_empty());
    }
}
