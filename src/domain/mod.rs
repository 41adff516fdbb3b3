//! Wire-level domain types: entities as the API transmits them, request
//! payloads, and the error taxonomy surfaced to callers.

pub mod entities;
pub mod error;
pub mod requests;

pub use entities::{Comment, LoginResponse, Post, Reply, User};
pub use error::ErrorKind;
