//! # 출석 통계 (StatsAggregator)
//!
//! 저장된 출석 기록에 대한 읽기 전용 집계입니다. 쓰기 작업은 없으며,
//! 저장소 에러는 삼키지 않고 그대로 전파합니다.

use sqlx::SqlitePool;

use crate::db;
use crate::error::AppError;
use crate::models::{AttendanceRate, AttendanceRecord, ClassStat, DateRange};

#[derive(Clone)]
pub struct StatsAggregator {
    pool: SqlitePool,
}

impl StatsAggregator {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 학생의 출석 기록 (최신순)
    pub async fn by_student(
        &self,
        student_id: &str,
        range: &DateRange,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        range.validate()?;
        db::records::list_by_student(&self.pool, student_id, range).await
    }

    /// 세션의 출석 기록 (출석 순)
    pub async fn by_session(&self, session_id: &str) -> Result<Vec<AttendanceRecord>, AppError> {
        db::records::list_by_session(&self.pool, session_id).await
    }

    /// 수업의 모든 세션에 걸친 출석 기록 (최신순)
    pub async fn by_class(
        &self,
        class_id: &str,
        range: &DateRange,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        range.validate()?;
        db::records::list_by_class(&self.pool, class_id, range).await
    }

    /// 한 번이라도 출석한 학생별 출석 횟수
    pub async fn class_stats(&self, class_id: &str) -> Result<Vec<ClassStat>, AppError> {
        db::records::class_stats(&self.pool, class_id).await
    }

    /// 수업 출석률. 현재 활성 등록 학생 수를 기준으로 계산합니다.
    pub async fn class_attendance_rate(&self, class_id: &str) -> Result<AttendanceRate, AppError> {
        let sessions = db::sessions::count_for_class(&self.pool, class_id).await?;
        let enrolled = db::enrollments::count_for_class(&self.pool, class_id, false).await?;
        let records = db::records::count_for_class(&self.pool, class_id).await?;

        Ok(AttendanceRate::compute(class_id, sessions, enrolled, records))
    }
}
