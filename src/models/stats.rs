use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// `marked_at`에 적용되는 반열린 구간 `[start, end)`. 양쪽 모두 생략 가능합니다.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(AppError::BadRequest(
                    "start must not be later than end".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// 수업별 학생 출석 횟수
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClassStat {
    pub student_id: String,
    pub student_name: String,
    pub attendance_count: i64,
}

/// 수업 출석률 = records / (sessions × enrolled)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRate {
    pub class_id: String,
    pub sessions: i64,
    pub enrolled: i64,
    pub records: i64,
    pub rate: f64,
}

impl AttendanceRate {
    pub fn compute(class_id: &str, sessions: i64, enrolled: i64, records: i64) -> Self {
        let possible = sessions * enrolled;
        let rate = if possible > 0 {
            records as f64 / possible as f64
        } else {
            0.0
        };
        Self {
            class_id: class_id.to_string(),
            sessions,
            enrolled,
            records,
            rate,
        }
    }
}
