//! Client-side data layer for an Instagram-style social service.
//!
//! The crate is organized around one idea: every read goes through a
//! tag-invalidating query cache, and every write declares which tags it
//! dirties. The [`Client`] wires the resource APIs to a shared HTTP
//! transport, the cache, and a durable auth session.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
mod util;

pub use application::{Client, ModalState, ViewPostModal};
pub use cache::{QueryCache, QueryKey, ResourceKind, Tag, TagId};
pub use config::Settings;
pub use domain::error::ErrorKind;
pub use infra::{AuthSession, Credentials, SessionStore};
