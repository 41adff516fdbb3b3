//! Application layer: one module per API resource, mirroring how the
//! service groups its endpoints, plus the client that wires them to the
//! shared transport, cache, and session.

pub mod auth;
pub mod client;
pub mod comment_likes;
pub mod comment_replies;
pub mod comment_reply_likes;
pub mod comments;
pub mod follows;
pub mod post_likes;
pub mod post_saves;
pub mod posts;
pub mod users;
pub mod view;

pub use client::Client;
pub use view::{ModalState, ViewPostModal};
