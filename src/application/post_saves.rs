//! Post saves (bookmarks), shaped exactly like post likes but tracked as a
//! separate edge so toggling one never dirties the other.

use std::sync::Arc;

use reqwest::Method;

use crate::cache::{QueryCache, QueryKey, ResourceKind, Tag};
use crate::domain::error::ErrorKind;
use crate::infra::transport::Transport;

pub struct PostSavesApi {
    transport: Arc<Transport>,
    cache: Arc<QueryCache>,
}

impl PostSavesApi {
    pub(crate) fn new(transport: Arc<Transport>, cache: Arc<QueryCache>) -> Self {
        Self { transport, cache }
    }

    pub async fn toggle(&self, post_id: i64) -> Result<(), ErrorKind> {
        let path = format!("post-saves/post/{post_id}");
        self.transport.request_unit(Method::POST, &path).await?;
        self.cache
            .invalidate(&[Tag::id(ResourceKind::PostSave, post_id)]);
        Ok(())
    }

    pub async fn count(&self, post_id: i64) -> Result<u64, ErrorKind> {
        let transport = Arc::clone(&self.transport);
        let path = format!("post-saves/post/{post_id}/save-count");
        self.cache
            .query(
                QueryKey::PostSaveCount(post_id),
                move |_: &u64| vec![Tag::id(ResourceKind::PostSave, post_id)],
                move || async move { transport.request(Method::GET, &path).await },
            )
            .await
    }

    pub async fn is_saved(&self, post_id: i64) -> Result<bool, ErrorKind> {
        let transport = Arc::clone(&self.transport);
        let path = format!("post-saves/post/{post_id}/is-saved");
        self.cache
            .query(
                QueryKey::PostSaved(post_id),
                move |_: &bool| vec![Tag::id(ResourceKind::PostSave, post_id)],
                move || async move { transport.request(Method::GET, &path).await },
            )
            .await
    }
}
