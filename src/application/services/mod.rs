//! Application services - Use case implementations
//!
//! Each service is a trait plus an `...Impl` that receives its ports at
//! construction and returns domain entities. The HTTP layer turns those into
//! DTOs.

pub mod auth_service;
pub mod character_service;
pub mod combat_service;
pub mod game_service;

pub use auth_service::{
    AuthError, AuthService, AuthServiceImpl, Claims, LoginRequest, RegisterRequest,
};
pub use character_service::{
    CharacterError, CharacterService, CharacterServiceImpl, CreateCharacterRequest,
};
pub use combat_service::{
    ActionResponse, BattlefieldRequest, CombatService, CombatServiceError, CombatServiceImpl,
    DiceFactory, StartCombatRequest,
};
pub use game_service::{
    CreateGameRequest, GameError, GameService, GameServiceImpl, UpdateGameRequest,
};
