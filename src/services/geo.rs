//! # 거리 계산
//!
//! 구면 지구 모델 위에서 하버사인(Haversine) 공식으로 두 좌표 사이의
//! 대원 거리(great-circle distance)를 미터 단위로 계산합니다.
//! 입력 좌표의 범위 검사는 호출하는 쪽의 책임입니다.

use crate::models::GeoPoint;

/// 지구 평균 반지름 (미터)
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// 두 좌표 사이의 거리(미터)를 계산합니다. 결과는 항상 0 이상입니다.
pub fn distance_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // 부동소수점 오차로 a가 [0, 1]을 살짝 벗어나는 경우를 막습니다.
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

pub fn distance_between(a: GeoPoint, b: GeoPoint) -> f64 {
    distance_meters(a.latitude, a.longitude, b.latitude, b.longitude)
}
