//! Cache - 콘텐츠 지문 (fingerprint)
//!
//! The explanation cache itself is run-scoped and lives in the orchestrator;
//! this module only provides the stable key.

mod hash;

pub use hash::{fingerprint, short_fingerprint};
