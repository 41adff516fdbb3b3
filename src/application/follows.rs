//! The follow graph.
//!
//! Counts and the followed flag carry a per-username follow tag plus the
//! graph-wide marker; follower/following user lists (in the users module)
//! subscribe to the marker, so one toggle refreshes every follow-derived
//! view at once.

use std::sync::Arc;

use reqwest::Method;

use crate::cache::{QueryCache, QueryKey, ResourceKind, Tag};
use crate::domain::error::ErrorKind;
use crate::infra::transport::{Transport, path_segment};

pub struct FollowsApi {
    transport: Arc<Transport>,
    cache: Arc<QueryCache>,
}

impl FollowsApi {
    pub(crate) fn new(transport: Arc<Transport>, cache: Arc<QueryCache>) -> Self {
        Self { transport, cache }
    }

    /// Follow if not yet following, unfollow otherwise.
    pub async fn toggle(&self, username: &str) -> Result<(), ErrorKind> {
        let path = format!("follows/following/{}", path_segment(username));
        self.transport.request_unit(Method::POST, &path).await?;
        self.cache.invalidate(&[
            Tag::name(ResourceKind::Follow, username),
            Tag::list(ResourceKind::Follow),
        ]);
        Ok(())
    }

    pub async fn follower_count(&self, username: &str) -> Result<u64, ErrorKind> {
        let transport = Arc::clone(&self.transport);
        let subject = username.to_string();
        let path = format!("follows/{}/follower-count", path_segment(username));
        self.cache
            .query(
                QueryKey::FollowerCount(username.to_string()),
                move |_: &u64| {
                    vec![
                        Tag::name(ResourceKind::Follow, subject),
                        Tag::list(ResourceKind::Follow),
                    ]
                },
                move || async move { transport.request(Method::GET, &path).await },
            )
            .await
    }

    pub async fn following_count(&self, username: &str) -> Result<u64, ErrorKind> {
        let transport = Arc::clone(&self.transport);
        let subject = username.to_string();
        let path = format!("follows/{}/following-count", path_segment(username));
        self.cache
            .query(
                QueryKey::FollowingCount(username.to_string()),
                move |_: &u64| {
                    vec![
                        Tag::name(ResourceKind::Follow, subject),
                        Tag::list(ResourceKind::Follow),
                    ]
                },
                move || async move { transport.request(Method::GET, &path).await },
            )
            .await
    }

    /// Whether the current user already follows `username`.
    pub async fn is_followed(&self, username: &str) -> Result<bool, ErrorKind> {
        let transport = Arc::clone(&self.transport);
        let subject = username.to_string();
        let path = format!("follows/already-follows/{}", path_segment(username));
        self.cache
            .query(
                QueryKey::Followed(username.to_string()),
                move |_: &bool| vec![Tag::name(ResourceKind::Follow, subject)],
                move || async move { transport.request(Method::GET, &path).await },
            )
            .await
    }
}
