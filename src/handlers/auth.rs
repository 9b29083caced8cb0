// src/handlers/auth.rs

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde_json::{Value, json};
use validator::ValidateEmail;

use crate::{
    config::Config,
    error::AppError,
    models::{
        pet::PetResponse,
        user::{
            AdoptionRequestResponse, MeResponse, PopulatedAdoptionRequest, RegisterRequest,
            ResetPasswordRequest, User, UserResponse, normalize_email,
        },
    },
    store::Store,
    utils::{
        cookies::{clear_session_cookie, session_cookie},
        hash::{hash_password, verify_password},
        jwt::sign_token,
    },
};

const MIN_PASSWORD_LEN: usize = 6;

/// Registers a new user.
///
/// Normalizes the email, hashes the password, creates the account with empty
/// favorites and request history, and signs the caller in by setting the
/// session cookie. Returns 201 and the user (excluding password).
pub async fn register(
    State(store): State<Store>,
    State(config): State<Config>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = payload.name.as_deref().unwrap_or("").trim().to_string();
    let email = payload.email.as_deref().unwrap_or("");
    let password = payload.password.as_deref().unwrap_or("");

    if name.is_empty() || email.trim().is_empty() || password.is_empty() {
        return Err(AppError::BadRequest(
            "Please provide all required fields".to_string(),
        ));
    }

    let email = normalize_email(email);
    if !email.validate_email() {
        return Err(AppError::BadRequest(
            "Please provide a valid email".to_string(),
        ));
    }

    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    if store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::BadRequest("User already exists".to_string()));
    }

    let hashed_password = hash_password(password)?;

    // The unique index closes the window between the existence check and the
    // insert: a concurrent duplicate registration surfaces here.
    let user = store
        .create_user(&name, &email, &hashed_password)
        .await
        .map_err(|e| {
            if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
                AppError::BadRequest("User already exists".to_string())
            } else {
                tracing::error!("Failed to register user: {:?}", e);
                AppError::from(e)
            }
        })?;

    let token = sign_token(user.id, &config.jwt_secret, config.jwt_expiration)?;
    let cookie = session_cookie(&token, config.jwt_expiration, config.is_production());

    let body = UserResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        favorites: Vec::new(),
        adoption_requests: Vec::new(),
    };

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "success": true, "user": body })),
    ))
}

/// Authenticates a user and starts a session.
///
/// The body is inspected as loose JSON because the contract distinguishes
/// wrong value types from missing or wrong credentials. Absence and mismatch
/// share one error message so the endpoint cannot be used to enumerate
/// accounts.
pub async fn login(
    State(store): State<Store>,
    State(config): State<Config>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(email), Some(password)) = (
        payload.get("email").and_then(Value::as_str),
        payload.get("password").and_then(Value::as_str),
    ) else {
        return Err(AppError::BadRequest("Invalid input types".to_string()));
    };

    let email = email.trim();
    let password = password.trim();
    if email.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password cannot be empty".to_string(),
        ));
    }

    let user = store
        .find_user_by_email(&normalize_email(email))
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid credentials".to_string()))?;

    if !verify_password(password, &user.password)? {
        return Err(AppError::BadRequest("Invalid credentials".to_string()));
    }

    let token = sign_token(user.id, &config.jwt_secret, config.jwt_expiration)?;
    let cookie = session_cookie(&token, config.jwt_expiration, config.is_production());

    let favorites = store.favorite_ids(user.id).await?;
    let adoption_requests = store
        .adoption_requests(user.id)
        .await?
        .into_iter()
        .map(AdoptionRequestResponse::from)
        .collect();

    let body = UserResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        favorites,
        adoption_requests,
    };

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "success": true, "user": body })),
    ))
}

/// Ends the session by clearing the cookie. Always succeeds.
pub async fn logout(State(config): State<Config>) -> impl IntoResponse {
    let cookie = clear_session_cookie(config.is_production());

    (
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "success": true, "message": "Logged out successfully" })),
    )
}

/// Returns the current user with favorites expanded to full pets and each
/// adoption request's pet expanded (null when the pet has been deleted).
pub async fn me(
    State(store): State<Store>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, AppError> {
    let favorites: Vec<PetResponse> = store
        .favorite_pets(user.id)
        .await?
        .into_iter()
        .map(PetResponse::from)
        .collect();

    let requests = store.adoption_requests(user.id).await?;
    let pet_ids: Vec<i64> = requests.iter().filter_map(|r| r.pet_id).collect();
    let pets_by_id: HashMap<i64, _> = store
        .pets_by_ids(&pet_ids)
        .await?
        .into_iter()
        .map(|pet| (pet.id, pet))
        .collect();

    let adoption_requests = requests
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

    let body = MeResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        favorites,
        adoption_requests,
        created_at: user.created_at,
    };

    Ok(Json(json!({ "success": true, "user": body })))
}

/// Replaces a user's password by email.
pub async fn reset_password(
    State(store): State<Store>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = payload.email.as_deref().unwrap_or("");
    let new_password = payload.new_password.as_deref().unwrap_or("");

    if email.trim().is_empty() || new_password.is_empty() {
        return Err(AppError::BadRequest(
            "Please provide email and new password".to_string(),
        ));
    }

    let user = store
        .find_user_by_email(&normalize_email(email))
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let hashed = hash_password(new_password)?;
    store.update_user_password(user.id, &hashed).await?;

    Ok(Json(
        json!({ "success": true, "message": "Password reset successful" }),
    ))
}
