//! Likes on comment replies.

use std::sync::Arc;

use reqwest::Method;

use crate::cache::{QueryCache, QueryKey, ResourceKind, Tag};
use crate::domain::error::ErrorKind;
use crate::infra::transport::Transport;

pub struct CommentReplyLikesApi {
    transport: Arc<Transport>,
    cache: Arc<QueryCache>,
}

impl CommentReplyLikesApi {
    pub(crate) fn new(transport: Arc<Transport>, cache: Arc<QueryCache>) -> Self {
        Self { transport, cache }
    }

    pub async fn toggle(&self, reply_id: i64) -> Result<(), ErrorKind> {
        let path = format!("comment-reply-likes/comment-reply/{reply_id}");
        self.transport.request_unit(Method::POST, &path).await?;
        self.cache
            .invalidate(&[Tag::id(ResourceKind::CommentReplyLike, reply_id)]);
        Ok(())
    }

    pub async fn count(&self, reply_id: i64) -> Result<u64, ErrorKind> {
        let transport = Arc::clone(&self.transport);
        let path = format!("comment-reply-likes/comment-reply/{reply_id}/like-count");
        self.cache
            .query(
                QueryKey::ReplyLikeCount(reply_id),
                move |_: &u64| vec![Tag::id(ResourceKind::CommentReplyLike, reply_id)],
                move || async move { transport.request(Method::GET, &path).await },
            )
            .await
    }

    pub async fn is_liked(&self, reply_id: i64) -> Result<bool, ErrorKind> {
        let transport = Arc::clone(&self.transport);
        let path = format!("comment-reply-likes/comment-reply/{reply_id}/is-liked");
        self.cache
            .query(
                QueryKey::ReplyLiked(reply_id),
                move |_: &bool| vec![Tag::id(ResourceKind::CommentReplyLike, reply_id)],
                move || async move { transport.request(Method::GET, &path).await },
            )
            .await
    }
}
