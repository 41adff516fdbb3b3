//! Comments on posts.
//!
//! Comment tags are keyed by the parent post id: the comment list and the
//! comment count for a post share one tag, so writing a comment refreshes
//! both together without touching other posts.

use std::sync::Arc;

use reqwest::Method;

use crate::cache::{QueryCache, QueryKey, ResourceKind, Tag};
use crate::domain::entities::Comment;
use crate::domain::error::ErrorKind;
use crate::domain::requests::WriteCommentRequest;
use crate::infra::transport::Transport;

pub struct CommentsApi {
    transport: Arc<Transport>,
    cache: Arc<QueryCache>,
}

impl CommentsApi {
    pub(crate) fn new(transport: Arc<Transport>, cache: Arc<QueryCache>) -> Self {
        Self { transport, cache }
    }

    pub async fn by_post(&self, post_id: i64) -> Result<Vec<Comment>, ErrorKind> {
        let transport = Arc::clone(&self.transport);
        let path = format!("comments/{post_id}");
        self.cache
            .query(
                QueryKey::CommentsByPostId(post_id),
                move |_: &Vec<Comment>| vec![Tag::id(ResourceKind::Comment, post_id)],
                move || async move { transport.request(Method::GET, &path).await },
            )
            .await
    }

    pub async fn count(&self, post_id: i64) -> Result<u64, ErrorKind> {
        let transport = Arc::clone(&self.transport);
        let path = format!("comments/post/{post_id}/comment-count");
        self.cache
            .query(
                QueryKey::CommentCount(post_id),
                move |_: &u64| vec![Tag::id(ResourceKind::Comment, post_id)],
                move || async move { transport.request(Method::GET, &path).await },
            )
            .await
    }

    pub async fn write(&self, request: &WriteCommentRequest) -> Result<(), ErrorKind> {
        self.transport
            .request_unit_with(Method::POST, "comments/create-comment", request)
            .await?;
        self.cache
            .invalidate(&[Tag::id(ResourceKind::Comment, request.post_id)]);
        Ok(())
    }
}
