//! Domain layer - Core combat logic with no I/O
//!
//! This layer contains:
//! - Entities: Battlefield, Participant, Encounter, Character, Game, User
//! - Value Objects: ids, positions, dice formulas, actions, combat rules
//! - Aggregates: EncounterSession, the unit the encounter store locks
//! - Domain Events: combat notifications for subscribers
//! - Domain Services: dice rolling and action resolution

pub mod aggregates;
pub mod entities;
pub mod errors;
pub mod events;
pub mod services;
pub mod value_objects;
