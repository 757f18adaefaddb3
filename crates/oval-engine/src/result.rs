//! 평가 결과 레코드
//!
//! [`EvaluationResult`]는 최상위 정의 하나의 평가 결과입니다.
//! `Send + Sync + 'static`이므로 [`ResultSender`]로 하위 리포터에 전달할 수 있습니다.
//!
//! # 사용 예시
//!
//! ```
//! use ovalguard_oval_engine::result::{Diagnostic, EvaluationResult};
//! use ovalguard_oval_engine::types::EvalStatus;
//!
//! let result = EvaluationResult::new(
//!     "oval:def:1",
//!     "RHSA-2024:0001",
//!     EvalStatus::True,
//!     vec![Diagnostic::warning("oval:def:1", "empty criteria")],
//! );
//! assert_eq!(result.warning_count(), 1);
//! ```

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::types::EvalStatus;

/// 평가 결과를 받는 채널 송신단
pub type ResultSender = mpsc::UnboundedSender<EvaluationResult>;

/// 진단 메시지 심각도
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    /// 평가를 계속할 수 있는 이상 징후
    Warning,
    /// 해당 노드를 `Error`로 만든 원인
    Error,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// 평가 중 기록된 진단 메시지
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 심각도
    pub level: DiagnosticLevel,
    /// 메시지를 기록한 정의 식별자
    pub definition_id: String,
    /// 메시지
    pub message: String,
}

impl Diagnostic {
    /// 에러 진단을 생성합니다.
    pub fn error(definition_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            definition_id: definition_id.into(),
            message: message.into(),
        }
    }

    /// 경고 진단을 생성합니다.
    pub fn warning(definition_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            definition_id: definition_id.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.level, self.definition_id, self.message)
    }
}

/// 최상위 정의 평가 결과
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// 결과 고유 ID
    pub id: String,
    /// 정의 식별자
    pub definition_id: String,
    /// 정의 제목
    pub title: String,
    /// 최종 상태
    pub status: EvalStatus,
    /// 중첩 extend_definition을 포함한 진단 메시지 (기록 순서)
    pub diagnostics: Vec<Diagnostic>,
    /// 평가 시각
    pub evaluated_at: SystemTime,
}

impl EvaluationResult {
    /// 새 결과 레코드를 생성합니다.
    pub fn new(
        definition_id: impl Into<String>,
        title: impl Into<String>,
        status: EvalStatus,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            definition_id: definition_id.into(),
            title: title.into(),
            status,
            diagnostics,
            evaluated_at: SystemTime::now(),
        }
    }

    /// 에러 진단 개수
    pub fn error_count(&self) -> usize {
        self.count(DiagnosticLevel::Error)
    }

    /// 경고 진단 개수
    pub fn warning_count(&self) -> usize {
        self.count(DiagnosticLevel::Warning)
    }

    fn count(&self, level: DiagnosticLevel) -> usize {
        self.diagnostics.iter().filter(|d| d.level == level).count()
    }
}

impl fmt::Display for EvaluationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short_id: String = self.id.chars().take(8).collect();
        write!(
            f,
            "EvaluationResult[{}] definition={} status={} errors={} warnings={}",
            short_id,
            self.definition_id,
            self.status,
            self.error_count(),
            self.warning_count(),
        )
    }
}
