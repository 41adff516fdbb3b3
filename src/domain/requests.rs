//! Request payloads sent to the API, serialized with camelCase wire names.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub description: String,
    pub image_url: String,
}

/// URL-variant post edit; the upload variant goes through multipart instead.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditPostRequest {
    pub description: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteCommentRequest {
    pub content: String,
    pub post_id: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteReplyRequest {
    pub content: String,
    pub comment_id: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCredentialsRequest {
    pub email: String,
    pub username: String,
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub bio_text: String,
    pub profile_picture_url: String,
}

/// Binary image payload for the multipart upload endpoints.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_comment_serializes_camel_case() {
        let req = WriteCommentRequest {
            content: "hi".to_string(),
            post_id: 9,
        };
        let value = serde_json::to_value(&req).expect("serializes");
        assert_eq!(value["postId"], 9);
        assert_eq!(value["content"], "hi");
    }

    #[test]
    fn update_credentials_serializes_camel_case() {
        let req = UpdateCredentialsRequest {
            email: "a@b.c".to_string(),
            username: "ada".to_string(),
            old_password: "old".to_string(),
            new_password: "new".to_string(),
        };
        let value = serde_json::to_value(&req).expect("serializes");
        assert_eq!(value["oldPassword"], "old");
        assert_eq!(value["newPassword"], "new");
    }
}
