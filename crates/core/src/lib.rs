#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, EvaluationError, OvalguardError};

// 설정
pub use config::{GeneralConfig, OvalConfig, OvalguardConfig};

// 로깅
pub use logging::init_tracing;
