//! Replies to comments. Reply tags are keyed by the parent comment id,
//! mirroring how comment tags are keyed by the parent post.

use std::sync::Arc;

use reqwest::Method;

use crate::cache::{QueryCache, QueryKey, ResourceKind, Tag};
use crate::domain::entities::Reply;
use crate::domain::error::ErrorKind;
use crate::domain::requests::WriteReplyRequest;
use crate::infra::transport::Transport;

pub struct CommentRepliesApi {
    transport: Arc<Transport>,
    cache: Arc<QueryCache>,
}

impl CommentRepliesApi {
    pub(crate) fn new(transport: Arc<Transport>, cache: Arc<QueryCache>) -> Self {
        Self { transport, cache }
    }

    pub async fn by_comment(&self, comment_id: i64) -> Result<Vec<Reply>, ErrorKind> {
        let transport = Arc::clone(&self.transport);
        let path = format!("comment-replies/comment/{comment_id}");
        self.cache
            .query(
                QueryKey::RepliesByCommentId(comment_id),
                move |_: &Vec<Reply>| vec![Tag::id(ResourceKind::CommentReply, comment_id)],
                move || async move { transport.request(Method::GET, &path).await },
            )
            .await
    }

    pub async fn count(&self, comment_id: i64) -> Result<u64, ErrorKind> {
        let transport = Arc::clone(&self.transport);
        let path = format!("comment-replies/comment/{comment_id}/reply-count");
        self.cache
            .query(
                QueryKey::ReplyCount(comment_id),
                move |_: &u64| vec![Tag::id(ResourceKind::CommentReply, comment_id)],
                move || async move { transport.request(Method::GET, &path).await },
            )
            .await
    }

    pub async fn write(&self, request: &WriteReplyRequest) -> Result<(), ErrorKind> {
        self.transport
            .request_unit_with(Method::POST, "comment-replies/create-reply", request)
            .await?;
        self.cache
            .invalidate(&[Tag::id(ResourceKind::CommentReply, request.comment_id)]);
        Ok(())
    }
}
