//! The top-level client: one transport, one cache, one session, shared by
//! every resource API.

use std::sync::Arc;

use crate::cache::QueryCache;
use crate::config::Settings;
use crate::infra::InfraError;
use crate::infra::session::{AuthSession, SessionStore};
use crate::infra::transport::Transport;

use super::auth::AuthApi;
use super::comment_likes::CommentLikesApi;
use super::comment_replies::CommentRepliesApi;
use super::comment_reply_likes::CommentReplyLikesApi;
use super::comments::CommentsApi;
use super::follows::FollowsApi;
use super::post_likes::PostLikesApi;
use super::post_saves::PostSavesApi;
use super::posts::PostsApi;
use super::users::UsersApi;
use super::view::ViewPostModal;

pub struct Client {
    transport: Arc<Transport>,
    cache: Arc<QueryCache>,
    session: Arc<AuthSession>,
    view_modal: ViewPostModal,
}

impl Client {
    /// Wire up the client: rehydrate the session from its storage path,
    /// size the cache, and build the HTTP transport against the configured
    /// base URL.
    pub fn new(settings: &Settings) -> Result<Self, InfraError> {
        let session = Arc::new(AuthSession::restore(SessionStore::new(
            settings.session.storage_path.clone(),
        )));
        let cache = Arc::new(QueryCache::new(&settings.cache));
        let transport = Arc::new(Transport::new(
            &settings.api,
            Arc::clone(&session),
            Arc::clone(&cache),
        )?);
        Ok(Self {
            transport,
            cache,
            session,
            view_modal: ViewPostModal::new(),
        })
    }

    pub fn auth(&self) -> AuthApi {
        AuthApi::new(
            Arc::clone(&self.transport),
            Arc::clone(&self.cache),
            Arc::clone(&self.session),
        )
    }

    pub fn users(&self) -> UsersApi {
        UsersApi::new(
            Arc::clone(&self.transport),
            Arc::clone(&self.cache),
            Arc::clone(&self.session),
        )
    }

    pub fn posts(&self) -> PostsApi {
        PostsApi::new(
            Arc::clone(&self.transport),
            Arc::clone(&self.cache),
            Arc::clone(&self.session),
        )
    }

    pub fn comments(&self) -> CommentsApi {
        CommentsApi::new(Arc::clone(&self.transport), Arc::clone(&self.cache))
    }

    pub fn comment_replies(&self) -> CommentRepliesApi {
        CommentRepliesApi::new(Arc::clone(&self.transport), Arc::clone(&self.cache))
    }

    pub fn comment_likes(&self) -> CommentLikesApi {
        CommentLikesApi::new(Arc::clone(&self.transport), Arc::clone(&self.cache))
    }

    pub fn comment_reply_likes(&self) -> CommentReplyLikesApi {
        CommentReplyLikesApi::new(Arc::clone(&self.transport), Arc::clone(&self.cache))
    }

    pub fn post_likes(&self) -> PostLikesApi {
        PostLikesApi::new(Arc::clone(&self.transport), Arc::clone(&self.cache))
    }

    pub fn post_saves(&self) -> PostSavesApi {
        PostSavesApi::new(Arc::clone(&self.transport), Arc::clone(&self.cache))
    }

    pub fn follows(&self) -> FollowsApi {
        FollowsApi::new(Arc::clone(&self.transport), Arc::clone(&self.cache))
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    pub fn view_modal(&self) -> &ViewPostModal {
        &self.view_modal
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }
}
