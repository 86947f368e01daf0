//! # 출석 세션 데이터베이스 쿼리 모듈
//!
//! 출석 세션의 생성, 조회, 연장, 비활성화를 담당하는 SQL 쿼리 함수들입니다.
//!
//! ## 세션 라이프사이클
//! ```text
//! [생성] insert_session() → 활성(is_active = 1)
//!        ├─ extend_session()          만료 시각 연장 (유효한 동안만)
//!        ├─ deactivate_session()      명시적 종료
//!        ├─ deactivate_active_for_class()  새 세션에 의해 대체
//!        └─ deactivate_expired()      만료 후 정리
//! ```
//!
//! 수업당 활성 세션이 하나뿐이라는 불변식은 부분 UNIQUE 인덱스
//! `idx_sessions_one_active_per_class`가 최종적으로 보장합니다.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use super::timestamp;
use crate::error::AppError;
use crate::models::AttendanceSession;

/// ID로 세션 하나를 조회합니다.
pub async fn get_session(pool: &SqlitePool, id: &str) -> Result<Option<AttendanceSession>, AppError> {
    let session = sqlx::query_as::<_, AttendanceSession>(
        r#"
        SELECT id, class_id, session_token, expires_at, is_active, created_at
        FROM attendance_sessions
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(session)
}

/// 토큰으로 세션을 조회합니다. 상태(활성/만료)와 관계없이 찾습니다.
pub async fn find_by_token(
    pool: &SqlitePool,
    token: &str,
) -> Result<Option<AttendanceSession>, AppError> {
    let session = sqlx::query_as::<_, AttendanceSession>(
        r#"
        SELECT id, class_id, session_token, expires_at, is_active, created_at
        FROM attendance_sessions
        WHERE session_token = ?
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(session)
}

/// `now` 시점에 유효한(활성 + 미만료) 세션만 토큰으로 조회합니다.
///
/// `expires_at >= now`는 `NOT (now > expires_at)`와 같습니다.
pub async fn find_valid_by_token(
    pool: &SqlitePool,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<AttendanceSession>, AppError> {
    let session = sqlx::query_as::<_, AttendanceSession>(
        r#"
        SELECT id, class_id, session_token, expires_at, is_active, created_at
        FROM attendance_sessions
        WHERE session_token = ? AND is_active = 1 AND expires_at >= ?
        "#,
    )
    .bind(token)
    .bind(timestamp(now))
    .fetch_optional(pool)
    .await?;

    Ok(session)
}

/// 수업의 현재 유효한 세션을 조회합니다.
pub async fn find_valid_for_class(
    pool: &SqlitePool,
    class_id: &str,
    now: DateTime<Utc>,
) -> Result<Option<AttendanceSession>, AppError> {
    let session = sqlx::query_as::<_, AttendanceSession>(
        r#"
        SELECT id, class_id, session_token, expires_at, is_active, created_at
        FROM attendance_sessions
        WHERE class_id = ? AND is_active = 1 AND expires_at >= ?
        "#,
    )
    .bind(class_id)
    .bind(timestamp(now))
    .fetch_optional(pool)
    .await?;

    Ok(session)
}

/// 수업의 모든 세션을 최신순으로 조회합니다.
pub async fn list_for_class(
    pool: &SqlitePool,
    class_id: &str,
) -> Result<Vec<AttendanceSession>, AppError> {
    let sessions = sqlx::query_as::<_, AttendanceSession>(
        r#"
        SELECT id, class_id, session_token, expires_at, is_active, created_at
        FROM attendance_sessions
        WHERE class_id = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(class_id)
    .fetch_all(pool)
    .await?;

    Ok(sessions)
}

/// 수업에 속한 세션 수 (출석률 계산용)
pub async fn count_for_class(pool: &SqlitePool, class_id: &str) -> Result<i64, AppError> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM attendance_sessions WHERE class_id = ?")
            .bind(class_id)
            .fetch_one(pool)
            .await?;

    Ok(count)
}

/// 수업의 활성 세션을 모두 비활성화합니다.
///
/// 트랜잭션 안에서 `insert_session()`보다 먼저 호출됩니다.
/// 트랜잭션의 첫 문장이 쓰기이므로 SQLite 쓰기 잠금을 곧바로 잡고,
/// 같은 수업에 대한 다른 생성 요청은 커밋될 때까지 기다립니다.
pub async fn deactivate_active_for_class(
    conn: &mut SqliteConnection,
    class_id: &str,
) -> Result<u64, AppError> {
    let result = sqlx::query(
        "UPDATE attendance_sessions SET is_active = 0 WHERE class_id = ? AND is_active = 1",
    )
    .bind(class_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// 새 세션 행을 삽입합니다.
///
/// 토큰이 이미 존재하면 `session_token` UNIQUE 제약 위반 에러가 반환됩니다.
pub async fn insert_session(
    conn: &mut SqliteConnection,
    id: &str,
    class_id: &str,
    token: &str,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO attendance_sessions (id, class_id, session_token, expires_at, is_active, created_at)
        VALUES (?, ?, ?, ?, 1, ?)
        "#,
    )
    .bind(id)
    .bind(class_id)
    .bind(token)
    .bind(timestamp(expires_at))
    .bind(timestamp(created_at))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// 유효한 세션의 만료 시각을 `seconds`만큼 늘립니다.
///
/// 조건 검사와 갱신이 하나의 UPDATE 문이므로 동시에 연장해도 갱신이 유실되지 않습니다.
/// 현재 만료 시각이 `ceiling`보다 늦으면 연장하지 않습니다.
///
/// ## 반환값
/// - `true`: 연장 성공
/// - `false`: 세션이 없거나, 이미 유효하지 않거나, 상한에 걸림
pub async fn extend_session(
    pool: &SqlitePool,
    id: &str,
    seconds: i64,
    now: DateTime<Utc>,
    ceiling: DateTime<Utc>,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE attendance_sessions
        SET expires_at = strftime('%Y-%m-%dT%H:%M:%fZ', expires_at, ?)
        WHERE id = ? AND is_active = 1 AND expires_at >= ? AND expires_at <= ?
        "#,
    )
    .bind(format!("+{} seconds", seconds))
    .bind(id)
    .bind(timestamp(now))
    .bind(timestamp(ceiling))
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// 세션을 비활성화합니다. 이미 비활성이어도 성공합니다.
///
/// ## 반환값
/// - `true`: 세션이 존재함
/// - `false`: 해당 ID의 세션이 없음
pub async fn deactivate_session(pool: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("UPDATE attendance_sessions SET is_active = 0 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// 만료됐지만 아직 활성으로 표시된 세션을 모두 비활성화하고 그 수를 반환합니다.
pub async fn deactivate_expired(pool: &SqlitePool, now: DateTime<Utc>) -> Result<u64, AppError> {
    let result = sqlx::query(
        "UPDATE attendance_sessions SET is_active = 0 WHERE is_active = 1 AND expires_at < ?",
    )
    .bind(timestamp(now))
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
