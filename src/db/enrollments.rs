//! # 수강 등록 쿼리
//!
//! `enrollments` 테이블은 `(student_id, class_id)`에 UNIQUE 제약이 있습니다.
//! 등록 행은 삭제하지 않고 `is_active`로만 켜고 끕니다.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::timestamp;
use crate::error::AppError;
use crate::models::Enrollment;

pub async fn find_enrollment(
    pool: &SqlitePool,
    student_id: &str,
    class_id: &str,
) -> Result<Option<Enrollment>, AppError> {
    let enrollment = sqlx::query_as::<_, Enrollment>(
        r#"
        SELECT id, student_id, class_id, is_active, enrolled_at
        FROM enrollments
        WHERE student_id = ? AND class_id = ?
        "#,
    )
    .bind(student_id)
    .bind(class_id)
    .fetch_optional(pool)
    .await?;

    Ok(enrollment)
}

/// 활성 등록이 있는지 확인합니다.
pub async fn has_active_enrollment(
    pool: &SqlitePool,
    student_id: &str,
    class_id: &str,
) -> Result<bool, AppError> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT 1 FROM enrollments WHERE student_id = ? AND class_id = ? AND is_active = 1",
    )
    .bind(student_id)
    .bind(class_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

/// 등록 행을 삽입하거나, 비활성 행이 있으면 다시 활성화합니다.
///
/// `ON CONFLICT ... DO UPDATE ... WHERE`: 이미 활성인 행과 충돌하면
/// 아무것도 바꾸지 않으므로 영향받은 행 수가 0이 됩니다.
/// 하나의 문장이라 동시에 두 번 등록해도 한쪽만 성공합니다.
///
/// ## 반환값
/// - `true`: 새로 등록했거나 재활성화함
/// - `false`: 이미 활성 등록이 있음
pub async fn upsert_enrollment(
    pool: &SqlitePool,
    id: &str,
    student_id: &str,
    class_id: &str,
    enrolled_at: DateTime<Utc>,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        INSERT INTO enrollments (id, student_id, class_id, is_active, enrolled_at)
        VALUES (?, ?, ?, 1, ?)
        ON CONFLICT (student_id, class_id) DO UPDATE
        SET is_active = 1
        WHERE enrollments.is_active = 0
        "#,
    )
    .bind(id)
    .bind(student_id)
    .bind(class_id)
    .bind(timestamp(enrolled_at))
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// 등록의 활성 상태를 바꿉니다. 등록 행이 없으면 `false`.
pub async fn set_enrollment_active(
    pool: &SqlitePool,
    student_id: &str,
    class_id: &str,
    is_active: bool,
) -> Result<bool, AppError> {
    let result =
        sqlx::query("UPDATE enrollments SET is_active = ? WHERE student_id = ? AND class_id = ?")
            .bind(is_active)
            .bind(student_id)
            .bind(class_id)
            .execute(pool)
            .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn count_for_class(
    pool: &SqlitePool,
    class_id: &str,
    include_inactive: bool,
) -> Result<i64, AppError> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM enrollments WHERE class_id = ? AND (? OR is_active = 1)",
    )
    .bind(class_id)
    .bind(include_inactive)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

pub async fn count_for_student(
    pool: &SqlitePool,
    student_id: &str,
    include_inactive: bool,
) -> Result<i64, AppError> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM enrollments WHERE student_id = ? AND (? OR is_active = 1)",
    )
    .bind(student_id)
    .bind(include_inactive)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// 수업의 등록 목록을 등록순으로 조회합니다.
pub async fn list_for_class(pool: &SqlitePool, class_id: &str) -> Result<Vec<Enrollment>, AppError> {
    let enrollments = sqlx::query_as::<_, Enrollment>(
        r#"
        SELECT id, student_id, class_id, is_active, enrolled_at
        FROM enrollments
        WHERE class_id = ?
        ORDER BY enrolled_at, id
        "#,
    )
    .bind(class_id)
    .fetch_all(pool)
    .await?;

    Ok(enrollments)
}
