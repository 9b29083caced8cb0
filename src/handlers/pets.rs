// src/handlers/pets.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    error::AppError,
    models::pet::{Health, MAX_AGE, NewPet, PET_TYPES, PetResponse, PetUpdate, PhotoUpload},
    store::Store,
};

/// Hard cap on uploaded photo size, enforced while draining the part.
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Text fields plus the optional photo file decoded from a pet form.
struct PetForm {
    fields: HashMap<String, String>,
    photo: Option<PhotoUpload>,
}

/// Walks a multipart pet form. The photo part must declare an image media
/// type and is size-checked chunk by chunk, so an oversize upload stops
/// accumulating memory as soon as it crosses the cap.
async fn read_pet_form(mut multipart: Multipart) -> Result<PetForm, AppError> {
    let mut fields = HashMap::new();
    let mut photo = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "photo" {
            // A file input left empty still produces a part, just without a
            // filename. Treat it as no upload.
            if field.file_name().map_or(true, str::is_empty) {
                continue;
            }

            let media_type = field.content_type().unwrap_or_default().to_string();
            if !media_type.starts_with("image/") {
                return Err(AppError::BadRequest(
                    "Only image files are allowed".to_string(),
                ));
            }

            // Drain the part even once it is over the cap (the global body
            // limit bounds how much that can be) so the client reliably
            // receives the rejection instead of a dropped connection.
            let mut bytes = Vec::new();
            let mut oversize = false;
            while let Some(chunk) = field
                .chunk()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?
            {
                if oversize {
                    continue;
                }
                if bytes.len() + chunk.len() > MAX_PHOTO_BYTES {
                    oversize = true;
                    bytes.clear();
                    continue;
                }
                bytes.extend_from_slice(&chunk);
            }
            if oversize {
                return Err(AppError::BadRequest(
                    "Photo must be 5MB or smaller".to_string(),
                ));
            }

            photo = Some(PhotoUpload { bytes, media_type });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            fields.insert(name, value);
        }
    }

    Ok(PetForm { fields, photo })
}

fn parse_age(raw: &str) -> Result<i32, AppError> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|age| (0..=MAX_AGE).contains(age))
        .ok_or_else(|| {
            AppError::BadRequest(format!("Age must be an integer between 0 and {}", MAX_AGE))
        })
}

/// `health` arrives as a JSON object string; absent flags default to false.
fn parse_health(raw: Option<&String>) -> Result<Health, AppError> {
    match raw {
        Some(s) if !s.trim().is_empty() => Ok(serde_json::from_str(s)?),
        _ => Ok(Health::default()),
    }
}

/// `characteristics` arrives comma-separated; entries are trimmed and empty
/// ones dropped.
fn parse_characteristics(raw: Option<&String>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Lists all pets. Public.
pub async fn list_pets(State(store): State<Store>) -> Result<impl IntoResponse, AppError> {
    let pets: Vec<PetResponse> = store
        .list_pets()
        .await?
        .into_iter()
        .map(PetResponse::from)
        .collect();

    Ok(Json(json!({ "success": true, "pets": pets })))
}

/// Retrieves a single pet by ID. Public.
pub async fn get_pet(
    State(store): State<Store>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let pet = store
        .find_pet(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Pet not found".to_string()))?;

    Ok(Json(
        json!({ "success": true, "pet": PetResponse::from(pet) }),
    ))
}

/// Creates a pet from a multipart form.
pub async fn create_pet(
    State(store): State<Store>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_pet_form(multipart).await?;

    let required = ["name", "type", "breed", "age", "location"];
    let missing = required.iter().any(|key| {
        form.fields
            .get(*key)
            .map_or(true, |value| value.trim().is_empty())
    });
    if missing {
        return Err(AppError::BadRequest(
            "Please provide all required fields: name, type, breed, age, and location".to_string(),
        ));
    }

    let pet_type = form.fields["type"].trim().to_string();
    if !PET_TYPES.contains(&pet_type.as_str()) {
        return Err(AppError::BadRequest(
            "Pet type must be one of: dog, cat, bird, other".to_string(),
        ));
    }

    let pet = store
        .create_pet(NewPet {
            name: form.fields["name"].trim().to_string(),
            pet_type,
            breed: form.fields["breed"].trim().to_string(),
            age: parse_age(&form.fields["age"])?,
            location: form.fields["location"].trim().to_string(),
            description: form.fields.get("description").cloned(),
            photo: form.photo,
            health: parse_health(form.fields.get("health"))?,
            characteristics: parse_characteristics(form.fields.get("characteristics")),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "pet": PetResponse::from(pet) })),
    ))
}

/// Updates a pet from a multipart form. Only the provided fields change.
pub async fn update_pet(
    State(store): State<Store>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_pet_form(multipart).await?;

    let age = match form.fields.get("age") {
        Some(raw) => Some(parse_age(raw)?),
        None => None,
    };

    let update = PetUpdate {
        name: form.fields.get("name").map(|s| s.trim().to_string()),
        breed: form.fields.get("breed").map(|s| s.trim().to_string()),
        age,
        location: form.fields.get("location").map(|s| s.trim().to_string()),
        description: form.fields.get("description").cloned(),
        photo: form.photo,
    };

    let pet = store
        .update_pet(id, update)
        .await?
        .ok_or_else(|| AppError::NotFound("Pet not found".to_string()))?;

    Ok(Json(
        json!({ "success": true, "pet": PetResponse::from(pet) }),
    ))
}

/// Deletes a pet. Favorites referencing it are swept by the store; adoption
/// history keeps its rows with the pet reference nulled.
pub async fn delete_pet(
    State(store): State<Store>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !store.delete_pet(id).await? {
        return Err(AppError::NotFound("Pet not found".to_string()));
    }

    Ok(Json(
        json!({ "success": true, "message": "Pet deleted successfully" }),
    ))
}
