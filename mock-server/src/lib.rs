use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub quantity: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetPost {
    #[serde(rename = "_id")]
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "userID")]
    pub user_id: String,
    pub status: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: String,
    pub item: Item,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "appleID")]
    pub apple_id: String,
    pub avatar: u8,
    pub organization_name: String,
    pub organization_category: String,
    pub organization_zip_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetPostAndUser {
    pub pet_post: PetPost,
    pub user: User,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    #[serde(rename = "appleID")]
    pub apple_id: String,
    #[serde(default)]
    pub avatar: u8,
    pub organization_name: String,
    pub organization_category: String,
    pub organization_zip_code: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItem {
    pub name: String,
    pub quantity: String,
    pub category: String,
    pub expiration_date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePetPost {
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub item: CreateItem,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct Authenticate {
    #[serde(rename = "appleID")]
    pub apple_id: String,
}

#[derive(Deserialize)]
pub struct UpdateStatus {
    pub status: String,
}

/// In-memory backend state. Posts keep insertion order so the last one is
/// the latest.
#[derive(Default)]
pub struct Store {
    pub posts: Vec<PetPost>,
    pub users: HashMap<String, User>,
    /// Issued bearer token → user id.
    pub tokens: HashMap<String, String>,
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    router(Db::default())
}

pub fn router(db: Db) -> Router {
    Router::new()
        .route("/petPost", get(list_posts).post(create_post))
        .route("/petPost/latest", get(latest_post))
        .route(
            "/petPost/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/user", post(create_user))
        .route("/user/{id}", get(get_user))
        .route("/auth", post(authenticate))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

async fn list_posts(State(db): State<Db>) -> Json<Vec<PetPost>> {
    let store = db.read().await;
    Json(store.posts.clone())
}

async fn latest_post(State(db): State<Db>) -> Result<Json<PetPostAndUser>, StatusCode> {
    let store = db.read().await;
    let pet_post = store.posts.last().cloned().ok_or(StatusCode::NOT_FOUND)?;
    let user = store
        .users
        .get(&pet_post.user_id)
        .cloned()
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(PetPostAndUser { pet_post, user }))
}

async fn create_post(
    State(db): State<Db>,
    Json(input): Json<CreatePetPost>,
) -> (StatusCode, Json<PetPost>) {
    let post = PetPost {
        id: new_id(),
        created_at: Utc::now(),
        user_id: input.user_id,
        status: input.status.unwrap_or_else(|| "open".to_string()),
        kind: input.kind,
        title: input.title,
        description: input.description,
        item: Item {
            id: new_id(),
            name: input.item.name,
            quantity: input.item.quantity,
            category: input.item.category,
            expiration_date: input.item.expiration_date,
        },
    };
    info!(id = %post.id, user = %post.user_id, "post created");
    db.write().await.posts.push(post.clone());
    (StatusCode::CREATED, Json(post))
}

async fn get_post(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<PetPost>, StatusCode> {
    let store = db.read().await;
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;
    if !store.tokens.contains_key(token) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    store
        .posts
        .iter()
        .find(|post| post.id == id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn update_post(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<UpdateStatus>,
) -> Result<Json<PetPost>, StatusCode> {
    let mut store = db.write().await;
    let post = store
        .posts
        .iter_mut()
        .find(|post| post.id == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    post.status = input.status;
    Ok(Json(post.clone()))
}

/// Unknown ids are acknowledged with `deletedCount: 0`, not 404.
async fn delete_post(State(db): State<Db>, Path(id): Path<String>) -> Json<Value> {
    let mut store = db.write().await;
    let before = store.posts.len();
    store.posts.retain(|post| post.id != id);
    let deleted = before - store.posts.len();
    info!(%id, deleted, "post delete");
    Json(json!({ "deletedCount": deleted }))
}

async fn create_user(
    State(db): State<Db>,
    Json(input): Json<CreateUser>,
) -> (StatusCode, Json<User>) {
    let user = User {
        id: new_id(),
        created_at: Utc::now(),
        apple_id: input.apple_id,
        avatar: input.avatar,
        organization_name: input.organization_name,
        organization_category: input.organization_category,
        organization_zip_code: input.organization_zip_code,
        email: input.email,
        phone: input.phone,
        website: input.website,
    };
    info!(id = %user.id, "user created");
    db.write().await.users.insert(user.id.clone(), user.clone());
    (StatusCode::CREATED, Json(user))
}

async fn get_user(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<Json<User>, StatusCode> {
    let store = db.read().await;
    store.users.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn authenticate(
    State(db): State<Db>,
    Json(input): Json<Authenticate>,
) -> Result<Json<Value>, StatusCode> {
    let mut store = db.write().await;
    let user_id = store
        .users
        .values()
        .find(|user| user.apple_id == input.apple_id)
        .map(|user| user.id.clone())
        .ok_or(StatusCode::NOT_FOUND)?;
    let token = new_id();
    store.tokens.insert(token.clone(), user_id.clone());
    info!(user = %user_id, "token issued");
    Ok(Json(json!({ "token": token, "userID": user_id })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> PetPost {
        PetPost {
            id: "p1".to_string(),
            created_at: DateTime::from_timestamp(1_652_193_000, 0).unwrap(),
            user_id: "u1".to_string(),
            status: "open".to_string(),
            kind: "need".to_string(),
            title: "Ração".to_string(),
            description: "Precisamos".to_string(),
            item: Item {
                id: "i1".to_string(),
                name: "Ração".to_string(),
                quantity: "5kg".to_string(),
                category: "Alimentos".to_string(),
                expiration_date: None,
            },
        }
    }

    #[test]
    fn post_serializes_with_wire_names() {
        let json = serde_json::to_value(post()).unwrap();
        assert_eq!(json["_id"], "p1");
        assert_eq!(json["userID"], "u1");
        assert_eq!(json["type"], "need");
        assert_eq!(json["createdAt"], "2022-05-10T14:30:00Z");
        assert!(json["item"].get("expirationDate").is_none());
    }

    #[test]
    fn create_post_defaults() {
        let input: CreatePetPost = serde_json::from_str(
            r#"{"userID":"u1","type":"donation","title":"t",
                "item":{"name":"n","quantity":"1","category":"Outros"}}"#,
        )
        .unwrap();
        assert!(input.status.is_none());
        assert!(input.description.is_empty());
        assert!(input.item.expiration_date.is_none());
    }

    #[test]
    fn create_user_ignores_client_timestamp() {
        let input: CreateUser = serde_json::from_str(
            r#"{"appleID":"a","avatar":1,"organizationName":"o","organizationCategory":"ONG",
                "organizationZipCode":"SP","createdAt":1652193000}"#,
        )
        .unwrap();
        assert_eq!(input.avatar, 1);
        assert!(input.email.is_none());
    }

    #[test]
    fn create_user_rejects_missing_identity() {
        let result: Result<CreateUser, _> = serde_json::from_str(
            r#"{"organizationName":"o","organizationCategory":"ONG","organizationZipCode":"SP"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn update_status_requires_status() {
        let result: Result<UpdateStatus, _> = serde_json::from_str("{}");
        assert!(result.is_err());
    }
}
