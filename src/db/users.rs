use crate::error::AppError;
use crate::models::user::{Identity, NewUser};
use sqlx::SqlitePool;

pub async fn find_identity(pool: &SqlitePool, id: &str) -> Result<Option<Identity>, AppError> {
    let identity = sqlx::query_as::<_, Identity>(
        r#"
        SELECT id, name, email, role, is_active
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(identity)
}

pub async fn create_user(pool: &SqlitePool, user: &NewUser) -> Result<Identity, AppError> {
    let id = uuid::Uuid::now_v7().to_string();

    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, role)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(user.role)
    .execute(pool)
    .await?;

    find_identity(pool, &id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created user".to_string()))
}

pub async fn set_user_active(pool: &SqlitePool, id: &str, is_active: bool) -> Result<bool, AppError> {
    let result = sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
        .bind(is_active)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
