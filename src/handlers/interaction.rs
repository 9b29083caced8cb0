// src/handlers/interaction.rs

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    error::AppError,
    models::{
        pet::{PetResponse, STATUS_ADOPTED},
        user::{PopulatedAdoptionRequest, REQUEST_APPROVED, User},
    },
    store::Store,
};

/// Toggle a pet in the current user's favorites set.
///
/// Membership is a set: adding twice or removing twice is a no-op at the
/// store, so the response always reports the actual new state.
pub async fn toggle_favorite(
    State(store): State<Store>,
    Extension(user): Extension<User>,
    Path(pet_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let pet = store
        .find_pet(pet_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User or pet not found".to_string()))?;

    let was_favorite = store.is_favorite(user.id, pet.id).await?;
    if was_favorite {
        store.remove_favorite(user.id, pet.id).await?;
    } else {
        store.add_favorite(user.id, pet.id).await?;
    }

    let message = if was_favorite {
        "Pet removed from favorites"
    } else {
        "Pet added to favorites"
    };

    Ok(Json(json!({
        "success": true,
        "isFavorite": !was_favorite,
        "message": message,
    })))
}

/// Adopt a pet.
///
/// The status transition is a conditional update, so of two concurrent
/// adopters exactly one wins; the loser re-observes `adopted` and gets the
/// same rejection as anyone arriving late. The pet is committed first, then
/// the approved request is appended to the user's history — if that second
/// write fails the pet stays adopted, which is the authoritative fact.
pub async fn adopt_pet(
    State(store): State<Store>,
    Extension(user): Extension<User>,
    Path(pet_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let pet = store
        .find_pet(pet_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Pet or user not found".to_string()))?;

    if pet.status == STATUS_ADOPTED {
        return Err(AppError::BadRequest(
            "This pet has already been adopted".to_string(),
        ));
    }

    if store.has_pending_request(user.id, pet.id).await? {
        return Err(AppError::BadRequest(
            "You already have a pending adoption request for this pet".to_string(),
        ));
    }

    let adopted = store.mark_adopted(pet.id).await?.ok_or_else(|| {
        // Lost the race: someone else transitioned the pet since our read.
        AppError::BadRequest("This pet has already been adopted".to_string())
    })?;

    store
        .push_adoption_request(user.id, adopted.id, REQUEST_APPROVED)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Pet adopted successfully",
        "pet": PetResponse::from(adopted),
    })))
}

/// List the current user's favorites as full pets.
pub async fn list_favorites(
    State(store): State<Store>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, AppError> {
    let favorites: Vec<PetResponse> = store
        .favorite_pets(user.id)
        .await?
        .into_iter()
        .map(PetResponse::from)
        .collect();

    Ok(Json(json!({ "success": true, "favorites": favorites })))
}

/// List the current user's adoption requests with pets expanded.
/// A request whose pet was deleted serializes with a null pet.
pub async fn list_adoption_requests(
    State(store): State<Store>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, AppError> {
    let requests = store.adoption_requests(user.id).await?;

    let pet_ids: Vec<i64> = requests.iter().filter_map(|r| r.pet_id).collect();
    let pets_by_id: HashMap<i64, _> = store
        .pets_by_ids(&pet_ids)
        .await?
        .into_iter()
        .map(|pet| (pet.id, pet))
        .collect();

    let adoption_requests: Vec<PopulatedAdoptionRequest> = requests
        .into_iter()
        .map(|request| PopulatedAdoptionRequest {
            pet_id: request
                .pet_id
                .and_then(|id| pets_by_id.get(&id).cloned())
                .map(PetResponse::from),
            status: request.status,
            created_at: request.created_at,
        })
        .collect();

    Ok(Json(
        json!({ "success": true, "adoptionRequests": adoption_requests }),
    ))
}
