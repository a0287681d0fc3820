//! Infrastructure layer - External adapters and implementations
//!
//! This layer contains:
//! - Persistence: SQLite users and characters, in-memory encounters
//! - HTTP: REST API routes
//! - WebSocket: Live combat events
//! - Config: Application configuration and combat rules
//! - State: Shared application state

pub mod combat_events;
pub mod config;
pub mod http;
pub mod persistence;
pub mod state;
pub mod websocket;
