//! Domain records and request payloads for the pet-post API.
//!
//! # Design
//! Field names follow the backend's JSON (`_id`, `userID`, camelCase) through
//! serde renames; the Rust side uses snake_case. The mock server defines its
//! own copies of these records, and the integration tests catch drift.
//!
//! `PostStatus` and `PostKind` keep unknown wire values verbatim in an
//! `Other` variant so a decode/encode round-trip never loses data.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An untyped JSON object, returned by endpoints without a fixed schema.
pub type RawObject = serde_json::Map<String, serde_json::Value>;

/// Lifecycle state of a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PostStatus {
    #[default]
    Open,
    Concluded,
    Other(String),
}

impl PostStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PostStatus::Open => "open",
            PostStatus::Concluded => "concluded",
            PostStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for PostStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "open" => PostStatus::Open,
            "concluded" => PostStatus::Concluded,
            _ => PostStatus::Other(raw),
        }
    }
}

impl From<PostStatus> for String {
    fn from(status: PostStatus) -> Self {
        match status {
            PostStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a post asks for something or offers it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PostKind {
    Need,
    Donation,
    Other(String),
}

impl PostKind {
    pub fn as_str(&self) -> &str {
        match self {
            PostKind::Need => "need",
            PostKind::Donation => "donation",
            PostKind::Other(raw) => raw,
        }
    }
}

impl From<String> for PostKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "need" => PostKind::Need,
            "donation" => PostKind::Donation,
            _ => PostKind::Other(raw),
        }
    }
}

impl From<PostKind> for String {
    fn from(kind: PostKind) -> Self {
        match kind {
            PostKind::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for PostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The good a post refers to. `quantity` is free text ("2 sacos", "10kg").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub quantity: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,
}

/// A need or donation published by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetPost {
    #[serde(rename = "_id")]
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "userID")]
    pub user_id: String,
    pub status: PostStatus,
    #[serde(rename = "type")]
    pub kind: PostKind,
    pub title: String,
    pub description: String,
    pub item: Item,
}

/// An organization or individual account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "appleID")]
    pub apple_id: String,
    /// Index into the fixed avatar set. Stored values are not range checked.
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

/// The most recent post together with its author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetPostAndUser {
    pub pet_post: PetPost,
    pub user: User,
}

/// Number of avatars the app ships; `avatar` indexes into them.
pub const AVATAR_COUNT: u8 = 4;

/// Payload for creating a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[serde(rename = "appleID")]
    pub apple_id: String,
    /// Must be below `AVATAR_COUNT`.
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
    /// Client-side creation time, sent as epoch seconds.
    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload for the item embedded in a new post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub name: String,
    pub quantity: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,
}

/// Payload for creating a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPetPost {
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: PostKind,
    pub title: String,
    pub description: String,
    pub item: NewItem,
    #[serde(default)]
    pub status: PostStatus,
}

/// Body of the authentication request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRequest {
    #[serde(rename = "appleID")]
    pub apple_id: String,
}

/// Body of the post status update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: PostStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post_json() -> serde_json::Value {
        json!({
            "_id": "p1",
            "createdAt": "2022-05-10T14:30:00Z",
            "userID": "u1",
            "status": "open",
            "type": "donation",
            "title": "Ração sobrando",
            "description": "Dois sacos fechados",
            "item": {
                "_id": "i1",
                "name": "Ração",
                "quantity": "2 sacos",
                "category": "Alimentos",
                "expirationDate": "2023-01-01T00:00:00Z"
            }
        })
    }

    #[test]
    fn pet_post_roundtrips_through_json() {
        let post: PetPost = serde_json::from_value(post_json()).unwrap();
        assert_eq!(post.kind, PostKind::Donation);
        assert_eq!(post.item.quantity, "2 sacos");
        assert_eq!(serde_json::to_value(&post).unwrap(), post_json());
    }

    #[test]
    fn unknown_status_is_preserved() {
        let mut raw = post_json();
        raw["status"] = json!("archived");
        let post: PetPost = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(post.status, PostStatus::Other("archived".into()));
        assert_eq!(serde_json::to_value(&post).unwrap(), raw);
    }

    #[test]
    fn item_without_expiration_or_id() {
        let item: Item = serde_json::from_str(
            r#"{"name":"Shampoo","quantity":"1","category":"Higiene"}"#,
        )
        .unwrap();
        assert!(item.id.is_none());
        assert!(item.expiration_date.is_none());
        let back = serde_json::to_value(&item).unwrap();
        assert!(back.get("expirationDate").is_none());
    }

    #[test]
    fn user_optional_contacts_default_to_none() {
        let user: User = serde_json::from_str(
            r#"{"_id":"u1","createdAt":"2022-05-10T14:30:00Z","appleID":"apple.1",
                "avatar":2,"organizationName":"Patas","organizationCategory":"ONG",
                "organizationZipCode":"SP","email":"a@b.org"}"#,
        )
        .unwrap();
        assert_eq!(user.email.as_deref(), Some("a@b.org"));
        assert!(user.phone.is_none());
        assert!(user.website.is_none());
    }

    #[test]
    fn new_user_sends_created_at_as_epoch_seconds() {
        let input = NewUser {
            apple_id: "apple.1".into(),
            avatar: 0,
            organization_name: "Patas".into(),
            organization_category: "ONG".into(),
            organization_zip_code: "SP".into(),
            email: None,
            phone: Some("11 9999-9999".into()),
            website: None,
            created_at: DateTime::from_timestamp(1_652_193_000, 0),
        };
        let body = serde_json::to_value(&input).unwrap();
        assert_eq!(body["appleID"], "apple.1");
        assert_eq!(body["organizationZipCode"], "SP");
        assert_eq!(body["createdAt"], 1_652_193_000);
        assert!(body.get("email").is_none());
    }

    #[test]
    fn new_post_status_defaults_to_open() {
        let input: NewPetPost = serde_json::from_value(json!({
            "userID": "u1",
            "type": "need",
            "title": "Precisamos de remédio",
            "description": "",
            "item": {"name": "Vermífugo", "quantity": "3", "category": "Remédios"}
        }))
        .unwrap();
        assert_eq!(input.status, PostStatus::Open);
        assert_eq!(input.kind, PostKind::Need);
    }

    #[test]
    fn status_update_serializes_raw_value() {
        let body = serde_json::to_string(&StatusUpdate {
            status: PostStatus::Concluded,
        })
        .unwrap();
        assert_eq!(body, r#"{"status":"concluded"}"#);
    }
}
