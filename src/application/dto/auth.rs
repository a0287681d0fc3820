use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::services::{LoginRequest, RegisterRequest};
use crate::domain::entities::User;

#[derive(Debug, Deserialize)]
pub struct RegisterRequestDto {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl From<RegisterRequestDto> for RegisterRequest {
    fn from(dto: RegisterRequestDto) -> Self {
        Self {
            username: dto.username,
            email: dto.email,
            password: dto.password,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequestDto {
    pub username: String,
    pub password: String,
}

impl From<LoginRequestDto> for LoginRequest {
    fn from(dto: LoginRequestDto) -> Self {
        Self {
            username: dto.username,
            password: dto.password,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponseDto {
    pub id: String,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponseDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponseDto {
    pub message: String,
    pub user: UserResponseDto,
}

#[derive(Debug, Serialize)]
pub struct LoginResponseDto {
    pub token: String,
    pub user: UserResponseDto,
}
