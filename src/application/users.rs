//! User profile queries and profile mutations.

use std::sync::Arc;

use reqwest::Method;
use reqwest::multipart::{Form, Part};

use crate::cache::{QueryCache, QueryKey, ResourceKind, Tag};
use crate::domain::entities::User;
use crate::domain::error::ErrorKind;
use crate::domain::requests::{ImageUpload, UpdateCredentialsRequest, UpdateProfileRequest};
use crate::infra::session::AuthSession;
use crate::infra::transport::{Transport, path_segment};

pub struct UsersApi {
    transport: Arc<Transport>,
    cache: Arc<QueryCache>,
    session: Arc<AuthSession>,
}

fn user_list_tags(users: &Vec<User>) -> Vec<Tag> {
    let mut tags: Vec<Tag> = users
        .iter()
        .map(|user| Tag::id(ResourceKind::User, user.id))
        .collect();
    tags.push(Tag::list(ResourceKind::UserList));
    tags
}

// Follower/following lists depend on the follow graph as well, so a follow
// toggle refreshes them without touching the plain user lists.
fn follow_list_tags(users: &Vec<User>) -> Vec<Tag> {
    let mut tags: Vec<Tag> = users
        .iter()
        .map(|user| Tag::id(ResourceKind::User, user.id))
        .collect();
    tags.push(Tag::list(ResourceKind::Follow));
    tags
}

impl UsersApi {
    pub(crate) fn new(
        transport: Arc<Transport>,
        cache: Arc<QueryCache>,
        session: Arc<AuthSession>,
    ) -> Self {
        Self {
            transport,
            cache,
            session,
        }
    }

    pub async fn all(&self) -> Result<Vec<User>, ErrorKind> {
        let transport = Arc::clone(&self.transport);
        self.cache
            .query(QueryKey::Users, user_list_tags, move || async move {
                transport.request(Method::GET, "users").await
            })
            .await
    }

    pub async fn by_username(&self, username: &str) -> Result<User, ErrorKind> {
        let transport = Arc::clone(&self.transport);
        let path = format!("users/{}", path_segment(username));
        self.cache
            .query(
                QueryKey::UserByUsername(username.to_string()),
                move |user: &User| {
                    vec![
                        Tag::id(ResourceKind::User, user.id),
                        Tag::name(ResourceKind::User, user.username.clone()),
                    ]
                },
                move || async move { transport.request(Method::GET, &path).await },
            )
            .await
    }

    /// Every user except the one currently logged in.
    pub async fn excluding_current(&self) -> Result<Vec<User>, ErrorKind> {
        let transport = Arc::clone(&self.transport);
        self.cache
            .query(
                QueryKey::UsersExcludingCurrent,
                user_list_tags,
                move || async move { transport.request(Method::GET, "users/excluded").await },
            )
            .await
    }

    pub async fn followers(&self, user_id: i64) -> Result<Vec<User>, ErrorKind> {
        let transport = Arc::clone(&self.transport);
        let path = format!("users/followers/{user_id}");
        self.cache
            .query(
                QueryKey::FollowersByUserId(user_id),
                follow_list_tags,
                move || async move { transport.request(Method::GET, &path).await },
            )
            .await
    }

    pub async fn followings(&self, user_id: i64) -> Result<Vec<User>, ErrorKind> {
        let transport = Arc::clone(&self.transport);
        let path = format!("users/followings/{user_id}");
        self.cache
            .query(
                QueryKey::FollowingsByUserId(user_id),
                follow_list_tags,
                move || async move { transport.request(Method::GET, &path).await },
            )
            .await
    }

    pub async fn search(&self, fragment: &str) -> Result<Vec<User>, ErrorKind> {
        let transport = Arc::clone(&self.transport);
        let path = format!("users/search/{}", path_segment(fragment));
        self.cache
            .query(
                QueryKey::UserSearch(fragment.to_string()),
                user_list_tags,
                move || async move { transport.request(Method::GET, &path).await },
            )
            .await
    }

    /// Change username/email/password for the logged-in user. The server
    /// invalidates the old token; callers log in again afterwards.
    pub async fn update_credentials(
        &self,
        request: &UpdateCredentialsRequest,
    ) -> Result<(), ErrorKind> {
        let current = self.current_username()?;
        let path = format!("users/{}/update-credentials", path_segment(&current));
        self.transport
            .request_unit_with(Method::PUT, &path, request)
            .await?;
        self.cache.invalidate(&[
            Tag::name(ResourceKind::User, current),
            Tag::list(ResourceKind::UserList),
        ]);
        Ok(())
    }

    /// Update bio text and profile picture via an already-hosted URL.
    pub async fn update_profile(&self, request: &UpdateProfileRequest) -> Result<(), ErrorKind> {
        let current = self.current_username()?;
        let path = format!("users/{}/update-profile-url", path_segment(&current));
        self.transport
            .request_unit_with(Method::PUT, &path, request)
            .await?;
        self.invalidate_profile(current);
        Ok(())
    }

    /// Update bio text and upload a new profile picture (multipart).
    pub async fn update_profile_with_upload(
        &self,
        bio_text: &str,
        image: ImageUpload,
    ) -> Result<(), ErrorKind> {
        let current = self.current_username()?;
        let path = format!("users/{}/update-profile-upload", path_segment(&current));
        let form = Form::new().text("bioText", bio_text.to_string()).part(
            "profileImage",
            Part::bytes(image.bytes).file_name(image.file_name),
        );
        self.transport
            .request_unit_multipart(Method::PUT, &path, form)
            .await?;
        self.invalidate_profile(current);
        Ok(())
    }

    fn invalidate_profile(&self, username: String) {
        // Profile pictures are denormalized onto posts, so the owner's post
        // views go stale along with the user entries.
        self.cache.invalidate(&[
            Tag::name(ResourceKind::User, username.clone()),
            Tag::list(ResourceKind::UserList),
            Tag::name(ResourceKind::Post, username),
        ]);
    }

    fn current_username(&self) -> Result<String, ErrorKind> {
        self.session.username().ok_or(ErrorKind::Unauthorized)
    }
}
