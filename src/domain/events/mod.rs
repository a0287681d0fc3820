//! Domain events - Notifications of state changes within the domain

pub mod combat_events;

pub use combat_events::CombatEvent;
