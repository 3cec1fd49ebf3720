//! API client core for the Miaujuda pet-welfare backend.
//!
//! # Overview
//! Organizations and individuals publish posts describing a pet-related need
//! or donation. This crate is the client side of that backend: it builds the
//! HTTP requests, parses the responses into typed records, and keeps the one
//! piece of persisted state, the bearer token.
//!
//! # Design
//! - `PetClient` is I/O-free: `build_*` produces an `HttpRequest`, `parse_*`
//!   consumes an `HttpResponse`. The host (or a `Transport`) does the I/O.
//! - `PetApi` composes build → send → parse into one `async fn` per
//!   operation on top of any `Transport`; `ReqwestTransport` is the default.
//! - Routes are an enum joined onto the base address with the `url` crate;
//!   which operations need the token is configured in an `AuthTable`.
//! - The token travels in an explicit `Session`, loaded once from a
//!   `TokenStore`.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod route;
pub mod session;
pub mod transport;
pub mod types;

pub use api::PetApi;
pub use client::PetClient;
pub use config::ClientConfig;
pub use error::{ApiError, ConfigError, ErrorKind, StoreError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use route::{AuthTable, Operation, Route};
pub use session::{FileTokenStore, MemoryTokenStore, Session, TokenStore};
#[cfg(feature = "reqwest-transport")]
pub use transport::ReqwestTransport;
pub use transport::Transport;
pub use types::{
    AuthRequest, Item, NewItem, NewPetPost, NewUser, PetPost, PetPostAndUser, PostKind,
    PostStatus, RawObject, StatusUpdate, User, AVATAR_COUNT,
};
