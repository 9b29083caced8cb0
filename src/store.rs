// src/store.rs

use sqlx::{PgPool, Postgres, QueryBuilder, types::Json};

use crate::models::{
    pet::{NewPet, Pet, PetUpdate, STATUS_ADOPTED},
    user::{AdoptionRequest, REQUEST_PENDING, User},
};

/// Typed access to the `users` and `pets` collections and the relation
/// tables between them. Handlers never touch SQL directly; every method is
/// a single statement, so per-document atomicity comes from the database.
#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---- users ----

    /// Inserts a user. The caller has already normalized the email and
    /// hashed the password; a duplicate email surfaces as a unique-index
    /// violation.
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn update_user_password(
        &self,
        id: i64,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET password = $1, updated_at = now() WHERE id = $2")
                .bind(password_hash)
                .bind(id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    // ---- favorites ----

    pub async fn favorite_ids(&self, user_id: i64) -> Result<Vec<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT pet_id FROM user_favorites WHERE user_id = $1 ORDER BY created_at, pet_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn is_favorite(&self, user_id: i64, pet_id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM user_favorites WHERE user_id = $1 AND pet_id = $2)",
        )
        .bind(user_id)
        .bind(pet_id)
        .fetch_one(&self.pool)
        .await
    }

    /// Set insertion: repeating the operation never creates a duplicate.
    pub async fn add_favorite(&self, user_id: i64, pet_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO user_favorites (user_id, pet_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(pet_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn remove_favorite(&self, user_id: i64, pet_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM user_favorites WHERE user_id = $1 AND pet_id = $2")
            .bind(user_id)
            .bind(pet_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// The user's favorites expanded to full pets, oldest first.
    pub async fn favorite_pets(&self, user_id: i64) -> Result<Vec<Pet>, sqlx::Error> {
        sqlx::query_as::<_, Pet>(
            r#"
            SELECT p.*
            FROM user_favorites f
            JOIN pets p ON p.id = f.pet_id
            WHERE f.user_id = $1
            ORDER BY f.created_at, f.pet_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    // ---- adoption requests ----

    /// The user's request history in append order.
    pub async fn adoption_requests(
        &self,
        user_id: i64,
    ) -> Result<Vec<AdoptionRequest>, sqlx::Error> {
        sqlx::query_as::<_, AdoptionRequest>(
            "SELECT * FROM adoption_requests WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn has_pending_request(
        &self,
        user_id: i64,
        pet_id: i64,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM adoption_requests
                WHERE user_id = $1 AND pet_id = $2 AND status = $3
            )
            "#,
        )
        .bind(user_id)
        .bind(pet_id)
        .bind(REQUEST_PENDING)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn push_adoption_request(
        &self,
        user_id: i64,
        pet_id: i64,
        status: &str,
    ) -> Result<AdoptionRequest, sqlx::Error> {
        sqlx::query_as::<_, AdoptionRequest>(
            r#"
            INSERT INTO adoption_requests (user_id, pet_id, status)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(pet_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
    }

    // ---- pets ----

    pub async fn list_pets(&self) -> Result<Vec<Pet>, sqlx::Error> {
        sqlx::query_as::<_, Pet>("SELECT * FROM pets ORDER BY id")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn find_pet(&self, id: i64) -> Result<Option<Pet>, sqlx::Error> {
        sqlx::query_as::<_, Pet>("SELECT * FROM pets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Fetches pets by id in one round trip; used to expand request history.
    pub async fn pets_by_ids(&self, ids: &[i64]) -> Result<Vec<Pet>, sqlx::Error> {
        sqlx::query_as::<_, Pet>("SELECT * FROM pets WHERE id = ANY($1)")
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await
    }

    pub async fn create_pet(&self, pet: NewPet) -> Result<Pet, sqlx::Error> {
        let (photo, photo_media_type) = match pet.photo {
            Some(upload) => (Some(upload.bytes), Some(upload.media_type)),
            None => (None, None),
        };

        sqlx::query_as::<_, Pet>(
            r#"
            INSERT INTO pets
            (name, type, breed, age, location, description, photo, photo_media_type,
             vaccinated, neutered, microchipped, characteristics)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(pet.name)
        .bind(pet.pet_type)
        .bind(pet.breed)
        .bind(pet.age)
        .bind(pet.location)
        .bind(pet.description)
        .bind(photo)
        .bind(photo_media_type)
        .bind(pet.health.vaccinated)
        .bind(pet.health.neutered)
        .bind(pet.health.microchipped)
        .bind(Json(pet.characteristics))
        .fetch_one(&self.pool)
        .await
    }

    /// Applies the provided fields and returns the post-update row, or None
    /// if the pet does not exist.
    pub async fn update_pet(&self, id: i64, update: PetUpdate) -> Result<Option<Pet>, sqlx::Error> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE pets SET ");
        let mut separated = builder.separated(", ");

        separated.push("updated_at = now()");

        if let Some(name) = update.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name);
        }

        if let Some(breed) = update.breed {
            separated.push("breed = ");
            separated.push_bind_unseparated(breed);
        }

        if let Some(age) = update.age {
            separated.push("age = ");
            separated.push_bind_unseparated(age);
        }

        if let Some(location) = update.location {
            separated.push("location = ");
            separated.push_bind_unseparated(location);
        }

        if let Some(description) = update.description {
            separated.push("description = ");
            separated.push_bind_unseparated(description);
        }

        if let Some(upload) = update.photo {
            separated.push("photo = ");
            separated.push_bind_unseparated(upload.bytes);
            separated.push("photo_media_type = ");
            separated.push_bind_unseparated(upload.media_type);
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(" RETURNING *");

        builder
            .build_query_as::<Pet>()
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn delete_pet(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM pets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Conditional transition into `adopted`: the first caller wins, a
    /// concurrent second caller gets None and must re-read to distinguish
    /// "already adopted" from "missing".
    pub async fn mark_adopted(&self, id: i64) -> Result<Option<Pet>, sqlx::Error> {
        sqlx::query_as::<_, Pet>(
            r#"
            UPDATE pets
            SET status = $1, updated_at = now()
            WHERE id = $2 AND status <> $1
            RETURNING *
            "#,
        )
        .bind(STATUS_ADOPTED)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }
}
