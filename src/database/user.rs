use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::user::{NewUser, UpdateProfileRequest, User};
use async_trait::async_trait;
use uuid::Uuid;

/// User-directory persistence consumed by the OAuth callback and the
/// account routes.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, new_user: &NewUser) -> Result<User, AppError>;
    async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn update_profile(&self, id: &Uuid, update: &UpdateProfileRequest) -> Result<User, AppError>;
    async fn set_stripe_customer_id(&self, id: &Uuid, customer_id: &str) -> Result<(), AppError>;
    async fn delete_user(&self, id: &Uuid) -> Result<(), AppError>;
}

#[async_trait]
impl UserRepository for PostgresRepository {
    async fn create_user(&self, new_user: &NewUser) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, google_id, name, given_name, family_name, profile_picture)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, email, google_id, name, given_name, family_name, profile_picture, stripe_customer_id, created_at, updated_at
            "#,
        )
        .bind(&new_user.email)
        .bind(&new_user.google_id)
        .bind(&new_user.name)
        .bind(&new_user.given_name)
        .bind(&new_user.family_name)
        .bind(&new_user.profile_picture)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, google_id, name, given_name, family_name, profile_picture, stripe_customer_id, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, google_id, name, given_name, family_name, profile_picture, stripe_customer_id, created_at, updated_at
            FROM users
            WHERE lower(email) = lower($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_profile(&self, id: &Uuid, update: &UpdateProfileRequest) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($1, name),
                given_name = COALESCE($2, given_name),
                family_name = COALESCE($3, family_name),
                updated_at = now()
            WHERE id = $4
            RETURNING id, email, google_id, name, given_name, family_name, profile_picture, stripe_customer_id, created_at, updated_at
            "#,
        )
        .bind(&update.name)
        .bind(&update.given_name)
        .bind(&update.family_name)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn set_stripe_customer_id(&self, id: &Uuid, customer_id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET stripe_customer_id = $1, updated_at = now() WHERE id = $2")
            .bind(customer_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_user(&self, id: &Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&self.pool).await?;

        Ok(())
    }
}
