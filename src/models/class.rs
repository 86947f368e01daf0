//! # 수업(Class) 모델 정의
//!
//! 수업 엔티티는 외부 관리 화면이 소유하며, 출석 코어는 교실 위치를
//! 읽기 위해서만 조회합니다.

use serde::{Deserialize, Serialize};

use super::GeoPoint;

/// 교실 위치: `classes` 테이블의 위치 컬럼들에 대응합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClassLocation {
    /// 위도 [-90, 90]
    pub latitude: f64,
    /// 경도 [-180, 180]
    pub longitude: f64,
    /// 사람이 읽을 수 있는 위치 이름 (예: "공학관 301호")
    #[sqlx(rename = "location_label")]
    pub label: String,
}

impl ClassLocation {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// 수업 엔티티: DB의 `classes` 테이블 한 행에 대응합니다.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Class {
    pub id: String,
    pub name: String,
    /// 담당 교사의 사용자 ID
    pub teacher_id: Option<String>,
    /// `#[sqlx(flatten)]`: 위치 컬럼들을 중첩 구조체로 모아서 읽습니다.
    #[sqlx(flatten)]
    pub location: ClassLocation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewClass {
    pub name: String,
    pub teacher_id: Option<String>,
    pub location: ClassLocation,
}
