//! # 미들웨어 모듈
//!
//! - `auth`: 외부 인증 서버가 발급한 Bearer 토큰을 검증하는 추출기(extractor)

pub mod auth;
