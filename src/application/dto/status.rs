use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct EndpointDto {
    pub path: &'static str,
    pub method: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StatusResponseDto {
    pub status: &'static str,
    pub version: &'static str,
    pub api: &'static str,
    pub endpoints: Vec<EndpointDto>,
}

const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("/api/status", "GET", "Get API status"),
    ("/api/v1/auth/register", "POST", "Register a new user"),
    ("/api/v1/auth/login", "POST", "Authenticate user"),
    ("/api/v1/characters", "GET", "List characters"),
    ("/api/v1/characters", "POST", "Create character"),
    ("/api/v1/characters/{id}", "GET", "Get character details"),
    ("/api/v1/games", "GET", "List games"),
    ("/api/v1/games", "POST", "Create game"),
    ("/api/v1/games/{id}", "GET", "Get game details"),
    ("/api/v1/games/{id}", "PUT", "Update game"),
    ("/api/v1/combat", "POST", "Start combat encounter"),
    ("/api/v1/combat/{id}", "GET", "Get combat state"),
    ("/api/v1/combat/{id}/action", "POST", "Perform combat action"),
    ("/api/v1/combat/{id}/end-turn", "POST", "End the current turn"),
    ("/api/v1/combat/{id}/log", "GET", "Get combat action log"),
    ("/api/v1/ws/combat/{id}", "GET", "Subscribe to combat events"),
];

impl StatusResponseDto {
    pub fn operational() -> Self {
        Self {
            status: "operational",
            version: env!("CARGO_PKG_VERSION"),
            api: "D&D 5e Combat API",
            endpoints: ENDPOINTS
                .iter()
                .map(|&(path, method, description)| EndpointDto {
                    path,
                    method,
                    description,
                })
                .collect(),
        }
    }
}
