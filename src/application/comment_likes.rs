//! Likes on comments, per-comment tagged like the post edges.

use std::sync::Arc;

use reqwest::Method;

use crate::cache::{QueryCache, QueryKey, ResourceKind, Tag};
use crate::domain::error::ErrorKind;
use crate::infra::transport::Transport;

pub struct CommentLikesApi {
    transport: Arc<Transport>,
    cache: Arc<QueryCache>,
}

impl CommentLikesApi {
    pub(crate) fn new(transport: Arc<Transport>, cache: Arc<QueryCache>) -> Self {
        Self { transport, cache }
    }

    pub async fn toggle(&self, comment_id: i64) -> Result<(), ErrorKind> {
        let path = format!("comment-likes/comment/{comment_id}");
        self.transport.request_unit(Method::POST, &path).await?;
        self.cache
            .invalidate(&[Tag::id(ResourceKind::CommentLike, comment_id)]);
        Ok(())
    }

    pub async fn count(&self, comment_id: i64) -> Result<u64, ErrorKind> {
        let transport = Arc::clone(&self.transport);
        let path = format!("comment-likes/comment/{comment_id}/like-count");
        self.cache
            .query(
                QueryKey::CommentLikeCount(comment_id),
                move |_: &u64| vec![Tag::id(ResourceKind::CommentLike, comment_id)],
                move || async move { transport.request(Method::GET, &path).await },
            )
            .await
    }

    pub async fn is_liked(&self, comment_id: i64) -> Result<bool, ErrorKind> {
        let transport = Arc::clone(&self.transport);
        let path = format!("comment-likes/comment/{comment_id}/is-liked");
        self.cache
            .query(
                QueryKey::CommentLiked(comment_id),
                move |_: &bool| vec![Tag::id(ResourceKind::CommentLike, comment_id)],
                move || async move { transport.request(Method::GET, &path).await },
            )
            .await
    }
}
