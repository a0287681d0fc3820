//! Aggregates - Cluster of domain objects treated as a single unit

pub mod encounter_session;

pub use encounter_session::{ActionOutcome, EncounterRetention, EncounterSession};
