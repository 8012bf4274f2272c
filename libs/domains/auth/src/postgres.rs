use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, Condition, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    SqlErr,
};

use crate::{
    entity,
    error::{AuthError, AuthResult},
    models::User,
    repository::UserRepository,
};

pub struct PgUserRepository {
    db: DatabaseConnection,
}

impl PgUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn email_matches(email: &str) -> Condition {
        Condition::all().add(Expr::cust_with_values(
            "LOWER(email) = $1",
            [email.to_lowercase()],
        ))
    }

    fn username_matches(username: &str) -> Condition {
        Condition::all().add(Expr::cust_with_values(
            "LOWER(username) = $1",
            [username.to_lowercase()],
        ))
    }
}

/// Unique-index violations on `id`, `email` or `username` become `Conflict`.
fn map_write_error(error: DbErr) -> AuthError {
    match error.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            tracing::warn!(%detail, "User write rejected by unique index");
            AuthError::Conflict("User with this email or username already exists".to_string())
        }
        _ => AuthError::Database(error),
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn get_by_id(&self, id: &str) -> AuthResult<Option<User>> {
        let model = entity::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn get_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let model = entity::Entity::find()
            .filter(Self::email_matches(email))
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn get_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let model = entity::Entity::find()
            .filter(Self::username_matches(username))
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn create(&self, user: User) -> AuthResult<User> {
        let active: entity::ActiveModel = (&user).into();
        let model = active.insert(&self.db).await.map_err(map_write_error)?;

        tracing::info!(user_id = %model.id, "Created user");
        Ok(model.into())
    }

    async fn update(&self, user: User) -> AuthResult<User> {
        let active: entity::ActiveModel = (&user).into();
        let model = active.update(&self.db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated | DbErr::RecordNotFound(_) => AuthError::user_not_found(),
            other => map_write_error(other),
        })?;

        tracing::debug!(user_id = %model.id, "Updated user");
        Ok(model.into())
    }

    async fn exists_by_email(&self, email: &str) -> AuthResult<bool> {
        let count = entity::Entity::find()
            .filter(Self::email_matches(email))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn exists_by_username(&self, username: &str) -> AuthResult<bool> {
        let count = entity::Entity::find()
            .filter(Self::username_matches(username))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }
}
