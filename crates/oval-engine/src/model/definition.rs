//! 정의(definition)와 기준(criteria) 트리
//!
//! [`Definition`]은 문서 로딩 시 한 번 생성되며, 이후에는 잠금으로 보호되는
//! 평가 결과(outcome)만 변경됩니다.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::result::Diagnostic;
use crate::types::{CriteriaOperator, EvalStatus};

/// 정의 메타데이터
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefinitionMetadata {
    /// 제목
    #[serde(default)]
    pub title: String,
    /// 설명
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// 확정된 평가 결과
///
/// 상태와 그 상태를 만든 진단 메시지를 함께 보관해
/// 캐시 재사용 시에도 진단을 재생할 수 있습니다.
#[derive(Debug, Clone)]
pub(crate) struct DefinitionOutcome {
    pub(crate) status: EvalStatus,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

/// OVAL 정의
#[derive(Debug, Serialize, Deserialize)]
pub struct Definition {
    /// 정의 식별자
    pub id: String,
    /// 메타데이터
    #[serde(default)]
    pub metadata: DefinitionMetadata,
    /// 루트 기준 노드
    pub criteria: Criteria,
    /// 평가 결과. 이 잠금을 잡은 상태에서만 평가와 갱신이 일어납니다.
    #[serde(skip)]
    pub(crate) outcome: Mutex<Option<DefinitionOutcome>>,
}

impl Definition {
    /// 새 정의를 생성합니다.
    pub fn new(id: impl Into<String>, title: impl Into<String>, criteria: Criteria) -> Self {
        Self {
            id: id.into(),
            metadata: DefinitionMetadata {
                title: title.into(),
                description: None,
            },
            criteria,
            outcome: Mutex::new(None),
        }
    }

    /// 제목을 반환합니다.
    pub fn title(&self) -> &str {
        &self.metadata.title
    }

    /// 현재 확정된 상태를 반환합니다. 평가 전이면 `NotEvaluated`입니다.
    ///
    /// 평가가 진행 중이면 끝날 때까지 기다립니다.
    pub fn status(&self) -> EvalStatus {
        self.lock_outcome()
            .as_ref()
            .map_or(EvalStatus::NotEvaluated, |outcome| outcome.status)
    }

    /// 평가 결과 잠금을 획득합니다.
    ///
    /// 결과는 잠금 안에서 한 번에 대입되므로 오염(poison)된 잠금의 값도 일관적입니다.
    pub(crate) fn lock_outcome(&self) -> MutexGuard<'_, Option<DefinitionOutcome>> {
        self.outcome.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// 기준 노드
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Criteria {
    /// 결합 연산자 (기본값 AND)
    #[serde(default)]
    pub operator: CriteriaOperator,
    /// 결합 결과 반전 여부
    #[serde(default)]
    pub negate: bool,
    /// 설명
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// 순서가 있는 자식 노드
    #[serde(default)]
    pub children: Vec<CriteriaNode>,
}

impl Criteria {
    /// AND 노드를 생성합니다.
    pub fn and(children: Vec<CriteriaNode>) -> Self {
        Self {
            operator: CriteriaOperator::And,
            children,
            ..Self::default()
        }
    }

    /// OR 노드를 생성합니다.
    pub fn or(children: Vec<CriteriaNode>) -> Self {
        Self {
            operator: CriteriaOperator::Or,
            children,
            ..Self::default()
        }
    }

    /// negate 플래그를 설정합니다.
    pub fn negated(mut self) -> Self {
        self.negate = true;
        self
    }

    /// 트리 전체에서 extend_definition 참조를 순서대로 수집합니다.
    pub fn extend_refs(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        self.collect_extend_refs(&mut refs);
        refs
    }

    fn collect_extend_refs<'a>(&'a self, out: &mut Vec<&'a str>) {
        for child in &self.children {
            match child {
                CriteriaNode::Criteria(nested) => nested.collect_extend_refs(out),
                CriteriaNode::ExtendDefinition(extend) => out.push(&extend.definition_ref),
                CriteriaNode::Criterion(_) => {}
            }
        }
    }
}

/// 기준 트리의 자식 노드
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CriteriaNode {
    /// 중첩 기준 노드
    Criteria(Criteria),
    /// 테스트 참조 리프
    Criterion(Criterion),
    /// 다른 정의 참조 리프
    ExtendDefinition(ExtendDefinition),
}

impl CriteriaNode {
    /// 테스트 참조 리프를 생성합니다.
    pub fn criterion(test_ref: impl Into<String>) -> Self {
        Self::Criterion(Criterion {
            test_ref: test_ref.into(),
            negate: false,
            comment: None,
        })
    }

    /// 정의 참조 리프를 생성합니다.
    pub fn extend(definition_ref: impl Into<String>) -> Self {
        Self::ExtendDefinition(ExtendDefinition {
            definition_ref: definition_ref.into(),
            negate: false,
            comment: None,
        })
    }

    /// 노드의 negate 플래그를 설정합니다.
    pub fn negated(mut self) -> Self {
        match &mut self {
            Self::Criteria(c) => c.negate = true,
            Self::Criterion(c) => c.negate = true,
            Self::ExtendDefinition(e) => e.negate = true,
        }
        self
    }
}

impl From<Criteria> for CriteriaNode {
    fn from(criteria: Criteria) -> Self {
        Self::Criteria(criteria)
    }
}

/// 테스트 참조 리프
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Criterion {
    /// 테스트 식별자
    pub test_ref: String,
    /// 결과 반전 여부
    #[serde(default)]
    pub negate: bool,
    /// 설명
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// 정의 참조 리프
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtendDefinition {
    /// 정의 식별자
    pub definition_ref: String,
    /// 결과 반전 여부
    #[serde(default)]
    pub negate: bool,
    /// 설명
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}
