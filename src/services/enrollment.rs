//! # 수강 등록 게이트 (EnrollmentGate)
//!
//! "이 학생이 이 수업에 출석할 수 있는가"에 답합니다.
//! 등록은 `(student_id, class_id)`당 하나이며, 재등록하면 기존 행을 다시 활성화합니다.

use std::sync::Arc;

use sqlx::SqlitePool;

use super::clock::Clock;
use crate::db;
use crate::error::AppError;
use crate::models::{Enrollment, Identity};

/// 신원 조회 결과가 출석/등록 가능한 학생인지 검사합니다.
///
/// 학생 역할이 아닌 신원은 학생 ID로 조회되지 않은 것과 같게 취급합니다.
pub fn check_student(identity: Option<Identity>) -> Result<Identity, AppError> {
    let identity = identity.ok_or(AppError::StudentNotFound)?;
    if !identity.role.can_mark_attendance() {
        return Err(AppError::StudentNotFound);
    }
    if !identity.is_active {
        return Err(AppError::InactiveStudent);
    }
    Ok(identity)
}

#[derive(Clone)]
pub struct EnrollmentGate {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl EnrollmentGate {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// 활성 등록이 있는지 확인합니다.
    pub async fn is_enrolled(&self, student_id: &str, class_id: &str) -> Result<bool, AppError> {
        db::enrollments::has_active_enrollment(&self.pool, student_id, class_id).await
    }

    /// 학생을 수업에 등록합니다.
    ///
    /// # 에러
    /// - `StudentNotFound` / `InactiveStudent`: 신원 문제
    /// - `ClassNotFound`: 수업이 없음
    /// - `AlreadyEnrolled`: 이미 활성 등록이 있음
    pub async fn enroll(&self, student_id: &str, class_id: &str) -> Result<Enrollment, AppError> {
        check_student(db::users::find_identity(&self.pool, student_id).await?)?;
        db::classes::find_by_id(&self.pool, class_id)
            .await?
            .ok_or(AppError::ClassNotFound)?;

        let id = uuid::Uuid::now_v7().to_string();
        let changed =
            db::enrollments::upsert_enrollment(&self.pool, &id, student_id, class_id, self.clock.now())
                .await?;
        if !changed {
            return Err(AppError::AlreadyEnrolled);
        }

        tracing::info!(student_id, class_id, "Student enrolled");
        self.find(student_id, class_id).await
    }

    /// 등록을 비활성화합니다. 행은 삭제하지 않습니다.
    pub async fn deactivate(&self, student_id: &str, class_id: &str) -> Result<Enrollment, AppError> {
        self.set_active(student_id, class_id, false).await
    }

    /// 비활성 등록을 다시 활성화합니다.
    pub async fn reactivate(&self, student_id: &str, class_id: &str) -> Result<Enrollment, AppError> {
        self.set_active(student_id, class_id, true).await
    }

    async fn set_active(
        &self,
        student_id: &str,
        class_id: &str,
        is_active: bool,
    ) -> Result<Enrollment, AppError> {
        if !db::enrollments::set_enrollment_active(&self.pool, student_id, class_id, is_active).await? {
            return Err(AppError::NotFound);
        }
        tracing::info!(student_id, class_id, is_active, "Enrollment toggled");
        self.find(student_id, class_id).await
    }

    async fn find(&self, student_id: &str, class_id: &str) -> Result<Enrollment, AppError> {
        db::enrollments::find_enrollment(&self.pool, student_id, class_id)
            .await?
            .ok_or(AppError::Internal("Failed to retrieve enrollment".to_string()))
    }

    pub async fn count_for_class(&self, class_id: &str, include_inactive: bool) -> Result<i64, AppError> {
        db::enrollments::count_for_class(&self.pool, class_id, include_inactive).await
    }

    pub async fn count_for_student(
        &self,
        student_id: &str,
        include_inactive: bool,
    ) -> Result<i64, AppError> {
        db::enrollments::count_for_student(&self.pool, student_id, include_inactive).await
    }

    pub async fn list_for_class(&self, class_id: &str) -> Result<Vec<Enrollment>, AppError> {
        db::enrollments::list_for_class(&self.pool, class_id).await
    }
}
