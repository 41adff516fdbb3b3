//! Post likes: a toggleable edge between the current user and a post.
//!
//! The like count and the "did I like this" flag for a post share one
//! per-post tag, so one toggle refreshes both and nothing else.

use std::sync::Arc;

use reqwest::Method;

use crate::cache::{QueryCache, QueryKey, ResourceKind, Tag};
use crate::domain::error::ErrorKind;
use crate::infra::transport::Transport;

pub struct PostLikesApi {
    transport: Arc<Transport>,
    cache: Arc<QueryCache>,
}

impl PostLikesApi {
    pub(crate) fn new(transport: Arc<Transport>, cache: Arc<QueryCache>) -> Self {
        Self { transport, cache }
    }

    /// Like if not yet liked, unlike otherwise. The server decides.
    pub async fn toggle(&self, post_id: i64) -> Result<(), ErrorKind> {
        let path = format!("post-likes/post/{post_id}");
        self.transport.request_unit(Method::POST, &path).await?;
        self.cache
            .invalidate(&[Tag::id(ResourceKind::PostLike, post_id)]);
        Ok(())
    }

    pub async fn count(&self, post_id: i64) -> Result<u64, ErrorKind> {
        let transport = Arc::clone(&self.transport);
        let path = format!("post-likes/post/{post_id}/like-count");
        self.cache
            .query(
                QueryKey::PostLikeCount(post_id),
                move |_: &u64| vec![Tag::id(ResourceKind::PostLike, post_id)],
                move || async move { transport.request(Method::GET, &path).await },
            )
            .await
    }

    pub async fn is_liked(&self, post_id: i64) -> Result<bool, ErrorKind> {
        let transport = Arc::clone(&self.transport);
        let path = format!("post-likes/post/{post_id}/is-liked");
        self.cache
            .query(
                QueryKey::PostLiked(post_id),
                move |_: &bool| vec![Tag::id(ResourceKind::PostLike, post_id)],
                move || async move { transport.request(Method::GET, &path).await },
            )
            .await
    }
}
