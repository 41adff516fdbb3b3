//! Post queries and mutations.
//!
//! List queries provide a per-id tag for every post they return plus the
//! collection marker, so editing one post refreshes only the views that
//! contain it while creating or deleting refreshes every list. The count
//! and by-username queries share the owner's name tag; creating or deleting
//! a post invalidates it, which keeps profile counts honest (the source
//! never invalidated its per-user count tag at all).

use std::sync::Arc;

use reqwest::Method;
use reqwest::multipart::{Form, Part};

use crate::cache::{QueryCache, QueryKey, ResourceKind, Tag};
use crate::domain::entities::Post;
use crate::domain::error::ErrorKind;
use crate::domain::requests::{CreatePostRequest, EditPostRequest, ImageUpload};
use crate::infra::session::AuthSession;
use crate::infra::transport::{Transport, path_segment};

pub struct PostsApi {
    transport: Arc<Transport>,
    cache: Arc<QueryCache>,
    session: Arc<AuthSession>,
}

fn post_list_tags(posts: &Vec<Post>) -> Vec<Tag> {
    let mut tags: Vec<Tag> = posts
        .iter()
        .map(|post| Tag::id(ResourceKind::Post, post.id))
        .collect();
    tags.push(Tag::list(ResourceKind::Post));
    tags
}

impl PostsApi {
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

    /// The main feed: every post.
    pub async fn feed(&self) -> Result<Vec<Post>, ErrorKind> {
        let transport = Arc::clone(&self.transport);
        self.cache
            .query(QueryKey::Posts, post_list_tags, move || async move {
                transport.request(Method::GET, "posts").await
            })
            .await
    }

    pub async fn by_id(&self, post_id: i64) -> Result<Post, ErrorKind> {
        let transport = Arc::clone(&self.transport);
        let path = format!("posts/get-by-id/{post_id}");
        self.cache
            .query(
                QueryKey::PostById(post_id),
                move |_: &Post| vec![Tag::id(ResourceKind::Post, post_id)],
                move || async move { transport.request(Method::GET, &path).await },
            )
            .await
    }

    pub async fn by_username(&self, username: &str) -> Result<Vec<Post>, ErrorKind> {
        let transport = Arc::clone(&self.transport);
        let owner = username.to_string();
        let path = format!("posts/{}", path_segment(username));
        self.cache
            .query(
                QueryKey::PostsByUsername(username.to_string()),
                move |_: &Vec<Post>| {
                    vec![
                        Tag::name(ResourceKind::Post, owner),
                        Tag::list(ResourceKind::Post),
                    ]
                },
                move || async move { transport.request(Method::GET, &path).await },
            )
            .await
    }

    /// How many posts a user has published.
    pub async fn count_by_username(&self, username: &str) -> Result<u64, ErrorKind> {
        let transport = Arc::clone(&self.transport);
        let owner = username.to_string();
        let path = format!("posts/{}/count", path_segment(username));
        self.cache
            .query(
                QueryKey::PostCount(username.to_string()),
                move |_: &u64| vec![Tag::name(ResourceKind::Post, owner)],
                move || async move { transport.request(Method::GET, &path).await },
            )
            .await
    }

    /// Feed excluding the current user's own posts.
    pub async fn excluding_current_user(&self) -> Result<Vec<Post>, ErrorKind> {
        let transport = Arc::clone(&self.transport);
        self.cache
            .query(
                QueryKey::PostsExcludingCurrent,
                post_list_tags,
                move || async move { transport.request(Method::GET, "posts/excluded").await },
            )
            .await
    }

    pub async fn liked_by_me(&self) -> Result<Vec<Post>, ErrorKind> {
        let transport = Arc::clone(&self.transport);
        self.cache
            .query(QueryKey::PostsLikedByMe, post_list_tags, move || async move {
                transport.request(Method::GET, "posts/liked-by-me").await
            })
            .await
    }

    /// Posts from accounts the current user follows.
    pub async fn following_feed(&self) -> Result<Vec<Post>, ErrorKind> {
        let transport = Arc::clone(&self.transport);
        self.cache
            .query(QueryKey::FollowingFeed, post_list_tags, move || async move {
                transport.request(Method::GET, "posts/my-followers").await
            })
            .await
    }

    /// Create a post referencing an already-hosted image URL.
    pub async fn create(&self, request: &CreatePostRequest) -> Result<(), ErrorKind> {
        self.transport
            .request_unit_with(Method::POST, "posts/create-post", request)
            .await?;
        self.invalidate_authored();
        Ok(())
    }

    /// Create a post by uploading the image itself (multipart).
    pub async fn upload(&self, description: &str, image: ImageUpload) -> Result<(), ErrorKind> {
        let form = Form::new()
            .text("description", description.to_string())
            .part("image", Part::bytes(image.bytes).file_name(image.file_name));
        self.transport
            .request_unit_multipart(Method::POST, "posts/upload", form)
            .await?;
        self.invalidate_authored();
        Ok(())
    }

    pub async fn edit_with_url(
        &self,
        post_id: i64,
        request: &EditPostRequest,
    ) -> Result<(), ErrorKind> {
        let path = format!("posts/edit-with-url/{post_id}");
        self.transport
            .request_unit_with(Method::PUT, &path, request)
            .await?;
        self.cache.invalidate(&[
            Tag::id(ResourceKind::Post, post_id),
            Tag::list(ResourceKind::Post),
        ]);
        Ok(())
    }

    pub async fn edit_with_upload(
        &self,
        post_id: i64,
        description: &str,
        image: ImageUpload,
    ) -> Result<(), ErrorKind> {
        let form = Form::new()
            .text("description", description.to_string())
            .part("image", Part::bytes(image.bytes).file_name(image.file_name));
        let path = format!("posts/edit-with-upload/{post_id}");
        self.transport
            .request_unit_multipart(Method::PUT, &path, form)
            .await?;
        self.cache.invalidate(&[
            Tag::id(ResourceKind::Post, post_id),
            Tag::list(ResourceKind::Post),
        ]);
        Ok(())
    }

    pub async fn delete(&self, post_id: i64) -> Result<(), ErrorKind> {
        let path = format!("posts/delete/{post_id}");
        self.transport.request_unit(Method::DELETE, &path).await?;
        let mut tags = vec![
            Tag::id(ResourceKind::Post, post_id),
            Tag::list(ResourceKind::Post),
        ];
        if let Some(username) = self.session.username() {
            tags.push(Tag::name(ResourceKind::Post, username));
        }
        self.cache.invalidate(&tags);
        Ok(())
    }

    fn invalidate_authored(&self) {
        let mut tags = vec![Tag::list(ResourceKind::Post)];
        if let Some(username) = self.session.username() {
            tags.push(Tag::name(ResourceKind::Post, username));
        }
        self.cache.invalidate(&tags);
    }
}
