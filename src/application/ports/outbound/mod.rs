//! Outbound ports - Interfaces that the application requires from external systems

mod combat_event_port;
mod repository_port;

pub use combat_event_port::CombatEventPort;
pub use repository_port::{
    CharacterRepositoryPort, EncounterRepositoryPort, GameRepositoryPort, SharedEncounter,
    UserRepositoryPort,
};
