//! Explain - 상위 K개 파일 설명
//!
//! - `submission`: 전송 텍스트 잘라내기 + fingerprint
//! - `orchestrator`: 중복 제거, 동시성 제한, 재시도, 취소

mod orchestrator;
mod submission;

pub use orchestrator::{explain, ExplanationOrchestrator};
pub use submission::{prepare, truncate, Submission};
