//! Response entities, mirrored field-for-field from the API's JSON shapes.
//!
//! Timestamps are carried as opaque strings. The server's formatting is not
//! part of this layer's contract and callers that need real instants parse
//! them at the edge.

use serde::{Deserialize, Serialize};

/// A user profile, optionally carrying the user's posts when the endpoint
/// returns them inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub bio_text: String,
    #[serde(default)]
    pub profile_picture_url: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub posts: Vec<Post>,
}

/// A post in the feed. The owner's username and picture are denormalized
/// onto the post by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub profile_picture_url: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// A comment on a post, with the authoring user nested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub content: String,
    #[serde(default)]
    pub created_at: String,
    pub app_user: User,
}

/// A reply attached to a comment, with the authoring user nested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: i64,
    pub content: String,
    #[serde(default)]
    pub created_at: String,
    pub app_user: User,
}

/// Successful login payload: the bearer token plus the canonical username.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    #[serde(default)]
    pub message: String,
}
