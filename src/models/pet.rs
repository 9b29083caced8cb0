// src/models/pet.rs

use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};

pub const PET_TYPES: [&str; 4] = ["dog", "cat", "bird", "other"];

pub const STATUS_ADOPTED: &str = "adopted";

pub const MAX_AGE: i32 = 30;

/// Represents the 'pets' table in the database.
///
/// Photo bytes live inline in the row; `photo` and `photo_media_type` are
/// either both present or both absent.
#[derive(Debug, Clone, FromRow)]
pub struct Pet {
    pub id: i64,
    pub name: String,
    #[sqlx(rename = "type")]
    pub pet_type: String,
    pub breed: String,
    pub age: i32,
    pub location: String,
    pub description: Option<String>,
    pub photo: Option<Vec<u8>>,
    pub photo_media_type: Option<String>,
    pub status: String,
    pub vaccinated: bool,
    pub neutered: bool,
    pub microchipped: bool,
    /// Stored as a JSONB array of short strings.
    pub characteristics: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Health flags, nested on the wire and flat in the row.
/// Arrives from the create form as a JSON object string; missing flags
/// default to false.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Health {
    #[serde(default)]
    pub vaccinated: bool,
    #[serde(default)]
    pub neutered: bool,
    #[serde(default)]
    pub microchipped: bool,
}

/// Wire form of a stored photo: a base64 data URL plus the declared media
/// type. Raw bytes never leave the server.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoResponse {
    pub data: String,
    pub media_type: String,
}

/// Client-safe form of a pet.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PetResponse {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub pet_type: String,
    pub breed: String,
    pub age: i32,
    pub location: String,
    pub description: Option<String>,
    pub photo: Option<PhotoResponse>,
    pub status: String,
    pub health: Health,
    pub characteristics: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Pet> for PetResponse {
    fn from(pet: Pet) -> Self {
        let photo = match (pet.photo, pet.photo_media_type) {
            (Some(bytes), Some(media_type)) => Some(PhotoResponse {
                data: format!(
                    "data:{};base64,{}",
                    media_type,
                    general_purpose::STANDARD.encode(&bytes)
                ),
                media_type,
            }),
            _ => None,
        };

        Self {
            id: pet.id,
            name: pet.name,
            pet_type: pet.pet_type,
            breed: pet.breed,
            age: pet.age,
            location: pet.location,
            description: pet.description,
            photo,
            status: pet.status,
            health: Health {
                vaccinated: pet.vaccinated,
                neutered: pet.neutered,
                microchipped: pet.microchipped,
            },
            characteristics: pet.characteristics.0,
            created_at: pet.created_at,
            updated_at: pet.updated_at,
        }
    }
}

/// Field set accepted by the create form, validated by the handler.
#[derive(Debug)]
pub struct NewPet {
    pub name: String,
    pub pet_type: String,
    pub breed: String,
    pub age: i32,
    pub location: String,
    pub description: Option<String>,
    pub photo: Option<PhotoUpload>,
    pub health: Health,
    pub characteristics: Vec<String>,
}

/// Optional field set accepted by the update form.
#[derive(Debug, Default)]
pub struct PetUpdate {
    pub name: Option<String>,
    pub breed: Option<String>,
    pub age: Option<i32>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub photo: Option<PhotoUpload>,
}

/// A decoded photo file part.
#[derive(Debug)]
pub struct PhotoUpload {
    pub bytes: Vec<u8>,
    pub media_type: String,
}
