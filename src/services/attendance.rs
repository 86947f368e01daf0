//! # 출석 제출 검증 파이프라인 (AttendanceValidator)
//!
//! 학생의 출석 제출을 아래 순서대로 검사하고, 모두 통과하면 기록을 저장합니다.
//! 첫 번째 실패에서 멈추며, 단계마다 서로 다른 에러 종류를 돌려줍니다.
//!
//! ```text
//! 1. 세션 조회          → SessionNotFound
//! 2. 활성 여부          → SessionInactive
//! 3. 만료 여부          → SessionExpired
//! 4. 학생 신원          → StudentNotFound / InactiveStudent
//! 5. 수강 등록          → NotEnrolled
//! 6. 중복 출석 사전 검사 → DuplicateAttendance
//! 7. 지오펜스 거리       → OutOfRange (거리 포함)
//! 8. 기록 저장          → UNIQUE 위반 시 DuplicateAttendance
//! ```
//!
//! 순서가 곧 에러 우선순위입니다. 범위 밖에서 만료된 세션에 제출하면
//! 범위 밖이 아니라 만료 에러를 받습니다.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::clock::Clock;
use super::enrollment::{check_student, EnrollmentGate};
use super::geo;
use super::sessions::SessionStore;
use super::{bounded, DEFAULT_STORE_TIMEOUT};
use crate::db;
use crate::error::AppError;
use crate::models::{
    AttendanceSession, AttendanceSubmission, ClassLocation, GeoPoint, MarkedAttendance,
};

/// 지오펜스 반경 기본값 (미터)
pub const DEFAULT_MAX_DISTANCE_METERS: f64 = 50.0;

/// 2~3단계: 세션이 활성이고 만료되지 않았는지 검사합니다.
pub fn check_session_state(session: &AttendanceSession, now: DateTime<Utc>) -> Result<(), AppError> {
    if !session.is_active {
        return Err(AppError::SessionInactive);
    }
    if session.is_expired_at(now) {
        return Err(AppError::SessionExpired);
    }
    Ok(())
}

/// 7단계: 교실과의 거리를 계산하고 허용 반경을 넘으면 거절합니다.
pub fn check_geofence(
    location: GeoPoint,
    classroom: &ClassLocation,
    max_distance_meters: f64,
) -> Result<f64, AppError> {
    let distance = geo::distance_between(location, classroom.point());
    if distance > max_distance_meters {
        return Err(AppError::OutOfRange {
            distance,
            max_distance: max_distance_meters,
        });
    }
    Ok(distance)
}

#[derive(Clone)]
pub struct AttendanceValidator {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
    sessions: SessionStore,
    enrollments: EnrollmentGate,
    timeout: Duration,
}

impl AttendanceValidator {
    pub fn new(
        pool: SqlitePool,
        clock: Arc<dyn Clock>,
        sessions: SessionStore,
        enrollments: EnrollmentGate,
    ) -> Self {
        Self {
            pool,
            clock,
            sessions,
            enrollments,
            timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 출석 제출을 검증하고 통과하면 기록을 저장합니다.
    ///
    /// 검증 에러(`AppError::is_validation`)는 그 제출에 대한 최종 결과이고,
    /// 저장소 에러와 시간 초과는 그대로 전파되어 호출자가 재시도 여부를 정합니다.
    pub async fn submit(&self, submission: AttendanceSubmission) -> Result<MarkedAttendance, AppError> {
        submission.location.validate()?;
        let max_distance = submission
            .max_distance_meters
            .unwrap_or(DEFAULT_MAX_DISTANCE_METERS);
        if !max_distance.is_finite() || max_distance < 0.0 {
            return Err(AppError::BadRequest(
                "max_distance_meters must be a non-negative number".to_string(),
            ));
        }

        let result = bounded(self.timeout, self.run_pipeline(&submission, max_distance)).await;

        match &result {
            Ok(marked) => tracing::info!(
                student_id = %submission.student_id,
                session_id = %marked.record.session_id,
                distance = marked.distance,
                "Attendance accepted"
            ),
            Err(e) if e.is_validation() => tracing::info!(
                student_id = %submission.student_id,
                kind = e.kind(),
                distance = e.distance(),
                "Attendance rejected"
            ),
            Err(e) => tracing::warn!(
                student_id = %submission.student_id,
                error = %e,
                "Attendance submission failed"
            ),
        }

        result
    }

    async fn run_pipeline(
        &self,
        submission: &AttendanceSubmission,
        max_distance: f64,
    ) -> Result<MarkedAttendance, AppError> {
        let now = self.clock.now();
        let student_id = submission.student_id.as_str();

        // 1. 세션 조회
        let session = self
            .sessions
            .resolve(&submission.session)
            .await?
            .ok_or(AppError::SessionNotFound)?;

        // 2-3. 활성/만료
        check_session_state(&session, now)?;

        // 4. 학생 신원
        check_student(db::users::find_identity(&self.pool, student_id).await?)?;

        // 5. 수강 등록
        if !self.enrollments.is_enrolled(student_id, &session.class_id).await? {
            return Err(AppError::NotEnrolled);
        }

        // 6. 중복 출석 (빠른 경로, 최종 판정은 8단계의 UNIQUE 제약)
        if db::records::find_for_session_and_student(&self.pool, &session.id, student_id)
            .await?
            .is_some()
        {
            return Err(AppError::DuplicateAttendance);
        }

        // 7. 지오펜스
        let class = db::classes::find_by_id(&self.pool, &session.class_id)
            .await?
            .ok_or(AppError::ClassNotFound)?;
        let distance = check_geofence(submission.location, &class.location, max_distance)?;

        // 8. 저장
        let id = uuid::Uuid::now_v7().to_string();
        let inserted = db::records::insert_record(
            &self.pool,
            &id,
            &session.id,
            student_id,
            submission.location,
            now,
        )
        .await;
        match inserted {
            Ok(()) => {}
            Err(e) if db::is_unique_violation(&e, "attendance_records.session_id") => {
                return Err(AppError::DuplicateAttendance);
            }
            Err(e) => return Err(e),
        }

        let record = db::records::get_record(&self.pool, &id)
            .await?
            .ok_or(AppError::Internal("Failed to retrieve attendance record".to_string()))?;

        Ok(MarkedAttendance { record, distance })
    }
}
