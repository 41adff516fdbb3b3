//! Cache key definitions.
//!
//! `QueryKey` identifies a cacheable query operation together with its
//! argument; `Tag` labels what a cached result depends on so mutations can
//! invalidate by set intersection instead of guessing at keys.

use std::fmt;

/// Resource families exposed by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    User,
    UserList,
    Post,
    Comment,
    CommentLike,
    CommentReply,
    CommentReplyLike,
    PostLike,
    PostSave,
    Follow,
}

/// Which slice of a resource family a tag refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagId {
    /// A single entity by numeric id.
    Id(i64),
    /// A single entity or derived edge by human-facing name (usernames).
    Name(String),
    /// The whole-collection marker (the source's "LIST"/"ALL"/"COUNT" ids).
    List,
}

/// A typed invalidation tag: mutations declare the tags they dirty, queries
/// declare the tags they provide, and any intersection marks the query stale.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub kind: ResourceKind,
    pub id: TagId,
}

impl Tag {
    pub fn id(kind: ResourceKind, id: i64) -> Self {
        Self {
            kind,
            id: TagId::Id(id),
        }
    }

    pub fn name(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            id: TagId::Name(name.into()),
        }
    }

    pub fn list(kind: ResourceKind) -> Self {
        Self {
            kind,
            id: TagId::List,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            TagId::Id(id) => write!(f, "{:?}:{id}", self.kind),
            TagId::Name(name) => write!(f, "{:?}:{name}", self.kind),
            TagId::List => write!(f, "{:?}:LIST", self.kind),
        }
    }
}

/// One variant per cacheable query operation, carrying its argument.
///
/// Mutations never get a key: they are not cached, they only invalidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    // Users
    Users,
    UserByUsername(String),
    UsersExcludingCurrent,
    FollowersByUserId(i64),
    FollowingsByUserId(i64),
    UserSearch(String),

    // Posts
    Posts,
    PostById(i64),
    PostsByUsername(String),
    PostCount(String),
    PostsExcludingCurrent,
    PostsLikedByMe,
    FollowingFeed,

    // Comments and replies
    CommentsByPostId(i64),
    CommentCount(i64),
    RepliesByCommentId(i64),
    ReplyCount(i64),

    // Like/save edges
    PostLikeCount(i64),
    PostLiked(i64),
    PostSaveCount(i64),
    PostSaved(i64),
    CommentLikeCount(i64),
    CommentLiked(i64),
    ReplyLikeCount(i64),
    ReplyLiked(i64),

    // Follow edges
    FollowerCount(String),
    FollowingCount(String),
    Followed(String),
}
