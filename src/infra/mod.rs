//! Infrastructure: HTTP transport, durable session storage, telemetry.

pub mod error;
pub mod session;
pub mod telemetry;
pub mod transport;

pub use error::InfraError;
pub use session::{AuthSession, Credentials, SessionStore};
pub use transport::Transport;
