//! # 출석 기록 쿼리 모듈
//!
//! 출석 기록의 삽입과 조회/집계 쿼리입니다.
//! 기록은 삽입 후 수정하지 않습니다.
//!
//! ## 기간 필터
//! 조회 함수의 `range`는 `marked_at`에 대한 반열린 구간 `[start, end)`입니다.
//! `(? IS NULL OR marked_at >= ?)` 패턴으로 경계가 없으면 조건을 건너뜁니다.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::timestamp;
use crate::error::AppError;
use crate::models::{AttendanceRecord, ClassStat, DateRange, GeoPoint};

/// 출석 기록 하나를 삽입합니다.
///
/// `(session_id, student_id)` UNIQUE 제약이 중복 출석을 막는 최종 장치입니다.
/// 동시에 두 요청이 들어오면 늦게 커밋하는 쪽이 제약 위반 에러를 받습니다.
pub async fn insert_record(
    pool: &SqlitePool,
    id: &str,
    session_id: &str,
    student_id: &str,
    location: GeoPoint,
    marked_at: DateTime<Utc>,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO attendance_records
            (id, session_id, student_id, latitude, longitude, marked_at, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(session_id)
    .bind(student_id)
    .bind(location.latitude)
    .bind(location.longitude)
    .bind(timestamp(marked_at))
    .bind(timestamp(marked_at))
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_record(pool: &SqlitePool, id: &str) -> Result<Option<AttendanceRecord>, AppError> {
    let record = sqlx::query_as::<_, AttendanceRecord>(
        r#"
        SELECT id, session_id, student_id, latitude, longitude, marked_at, created_at
        FROM attendance_records
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// 세션-학생 쌍의 기록을 조회합니다 (중복 출석 사전 검사).
pub async fn find_for_session_and_student(
    pool: &SqlitePool,
    session_id: &str,
    student_id: &str,
) -> Result<Option<AttendanceRecord>, AppError> {
    let record = sqlx::query_as::<_, AttendanceRecord>(
        r#"
        SELECT id, session_id, student_id, latitude, longitude, marked_at, created_at
        FROM attendance_records
        WHERE session_id = ? AND student_id = ?
        "#,
    )
    .bind(session_id)
    .bind(student_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// 학생의 출석 기록을 최신순으로 조회합니다.
pub async fn list_by_student(
    pool: &SqlitePool,
    student_id: &str,
    range: &DateRange,
) -> Result<Vec<AttendanceRecord>, AppError> {
    let start = range.start.map(timestamp);
    let end = range.end.map(timestamp);

    let records = sqlx::query_as::<_, AttendanceRecord>(
        r#"
        SELECT id, session_id, student_id, latitude, longitude, marked_at, created_at
        FROM attendance_records
        WHERE student_id = ?
          AND (? IS NULL OR marked_at >= ?)
          AND (? IS NULL OR marked_at < ?)
        ORDER BY marked_at DESC, id DESC
        "#,
    )
    .bind(student_id)
    .bind(&start)
    .bind(&start)
    .bind(&end)
    .bind(&end)
    .fetch_all(pool)
    .await?;

    Ok(records)
}

/// 세션의 출석 기록을 출석 순서대로 조회합니다.
pub async fn list_by_session(
    pool: &SqlitePool,
    session_id: &str,
) -> Result<Vec<AttendanceRecord>, AppError> {
    let records = sqlx::query_as::<_, AttendanceRecord>(
        r#"
        SELECT id, session_id, student_id, latitude, longitude, marked_at, created_at
        FROM attendance_records
        WHERE session_id = ?
        ORDER BY marked_at, id
        "#,
    )
    .bind(session_id)
    .fetch_all(pool)
    .await?;

    Ok(records)
}

/// 수업의 모든 세션에 걸친 출석 기록을 최신순으로 조회합니다.
///
/// 기록에는 수업 ID가 없으므로 세션 테이블과 JOIN합니다.
pub async fn list_by_class(
    pool: &SqlitePool,
    class_id: &str,
    range: &DateRange,
) -> Result<Vec<AttendanceRecord>, AppError> {
    let start = range.start.map(timestamp);
    let end = range.end.map(timestamp);

    let records = sqlx::query_as::<_, AttendanceRecord>(
        r#"
        SELECT r.id, r.session_id, r.student_id, r.latitude, r.longitude,
               r.marked_at, r.created_at
        FROM attendance_records r
        JOIN attendance_sessions s ON s.id = r.session_id
        WHERE s.class_id = ?
          AND (? IS NULL OR r.marked_at >= ?)
          AND (? IS NULL OR r.marked_at < ?)
        ORDER BY r.marked_at DESC, r.id DESC
        "#,
    )
    .bind(class_id)
    .bind(&start)
    .bind(&start)
    .bind(&end)
    .bind(&end)
    .fetch_all(pool)
    .await?;

    Ok(records)
}

/// 수업에 한 번이라도 출석한 학생별 출석 횟수를 집계합니다.
///
/// ```sql
/// attendance_records ──→ attendance_sessions (class_id 필터)
///         └────────────→ users (학생 이름)
/// ```
pub async fn class_stats(pool: &SqlitePool, class_id: &str) -> Result<Vec<ClassStat>, AppError> {
    let stats = sqlx::query_as::<_, ClassStat>(
        r#"
        SELECT r.student_id AS student_id,
               u.name AS student_name,
               COUNT(*) AS attendance_count
        FROM attendance_records r
        JOIN attendance_sessions s ON s.id = r.session_id
        JOIN users u ON u.id = r.student_id
        WHERE s.class_id = ?
        GROUP BY r.student_id, u.name
        ORDER BY attendance_count DESC, student_name
        "#,
    )
    .bind(class_id)
    .fetch_all(pool)
    .await?;

    Ok(stats)
}

/// 수업 전체 출석 기록 수
pub async fn count_for_class(pool: &SqlitePool, class_id: &str) -> Result<i64, AppError> {
    let (count,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM attendance_records r
        JOIN attendance_sessions s ON s.id = r.session_id
        WHERE s.class_id = ?
        "#,
    )
    .bind(class_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
