//! # 수업 조회 쿼리
//!
//! 수업 데이터는 외부 관리 기능이 소유합니다.
//! 출석 코어는 교실 위치와 담당 교사를 확인하기 위해 조회만 합니다.

use crate::error::AppError;
use crate::models::{Class, NewClass};
use sqlx::SqlitePool;

/// ID로 수업 하나를 조회합니다.
pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Class>, AppError> {
    let class = sqlx::query_as::<_, Class>(
        r#"
        SELECT id, name, teacher_id, latitude, longitude, location_label
        FROM classes
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(class)
}

/// 수업을 생성합니다. 관리 기능과 테스트 픽스처에서 사용합니다.
pub async fn create_class(pool: &SqlitePool, class: &NewClass) -> Result<Class, AppError> {
    class.location.point().validate()?;

    let id = uuid::Uuid::now_v7().to_string();

    sqlx::query(
        r#"
        INSERT INTO classes (id, name, teacher_id, latitude, longitude, location_label)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&class.name)
    .bind(&class.teacher_id)
    .bind(class.location.latitude)
    .bind(class.location.longitude)
    .bind(&class.location.label)
    .execute(pool)
    .await?;

    find_by_id(pool, &id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created class".to_string()))
}
