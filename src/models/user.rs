// src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::pet::PetResponse;

pub const REQUEST_PENDING: &str = "pending";
pub const REQUEST_APPROVED: &str = "approved";

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,

    pub name: String,

    /// Normalized (trimmed, lowercased) email. Unique.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Represents the 'adoption_requests' table: one user's append-only history.
/// `pet_id` is nulled when the pet is deleted.
#[derive(Debug, Clone, FromRow)]
pub struct AdoptionRequest {
    pub id: i64,
    pub user_id: i64,
    pub pet_id: Option<i64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Wire form of an adoption request as stored: the pet as a bare id.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdoptionRequestResponse {
    pub pet_id: Option<i64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<AdoptionRequest> for AdoptionRequestResponse {
    fn from(request: AdoptionRequest) -> Self {
        Self {
            pet_id: request.pet_id,
            status: request.status,
            created_at: request.created_at,
        }
    }
}

/// Wire form of an adoption request with the pet expanded.
/// The pet is null when it has since been deleted.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedAdoptionRequest {
    pub pet_id: Option<PetResponse>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// User payload returned by register and login: relations as bare pet ids.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub favorites: Vec<i64>,
    pub adoption_requests: Vec<AdoptionRequestResponse>,
}

/// User payload returned by /auth/me: relations expanded to full pets.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub favorites: Vec<PetResponse>,
    pub adoption_requests: Vec<PopulatedAdoptionRequest>,
    pub created_at: DateTime<Utc>,
}

/// DTO for registration. Fields are optional so the handler can answer
/// missing input with the contract's message instead of a decode rejection.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// DTO for password reset.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: Option<String>,
    pub new_password: Option<String>,
}

/// Normalizes an email for storage and lookup: trimmed, lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
