//! Data Transfer Objects - For API boundaries
//!
//! DTOs live in the application layer so infrastructure (HTTP/WebSocket) can
//! serialize/deserialize without tying the domain model to the wire format.

pub mod auth;
pub mod character;
pub mod combat;
pub mod game;
pub mod status;

pub use auth::*;
pub use character::*;
pub use combat::*;
pub use game::*;
pub use status::*;
