//! 기준(criteria) 트리 해석기
//!
//! 자식 노드를 모두 평가하고 각자의 negate 플래그를 적용한 뒤 결합합니다.
//! 해석할 수 없는 리프가 있어도 형제 노드 평가는 계속됩니다.
//!
//! | 연산자 | 규칙 |
//! |--------|------|
//! | AND | False가 하나라도 있으면 False, 아니면 Error, 아니면 Unknown, 아니면 True |
//! | OR  | True가 하나라도 있으면 True, 아니면 Error, 아니면 Unknown, 아니면 False |
//!
//! `NotEvaluated`는 결합 시 `Unknown`과 같이 취급합니다.

use tracing::{debug, warn};

use crate::context::EvalContext;
use crate::evaluator::OvalEvaluator;
use crate::inventory::SystemInventory;
use crate::model::{Criteria, CriteriaNode, Criterion, ExtendDefinition};
use crate::types::{CriteriaOperator, EvalStatus};

/// 기준 노드를 평가합니다.
///
/// `definition_id`는 진단 메시지에 기록할 소유 정의의 식별자입니다.
pub fn evaluate<I: SystemInventory>(
    criteria: &Criteria,
    definition_id: &str,
    evaluator: &OvalEvaluator<I>,
    ctx: &EvalContext,
) -> EvalStatus {
    if criteria.children.is_empty() {
        ctx.record_warning(definition_id, "criteria node has no children");
        return EvalStatus::Unknown.negate_if(criteria.negate);
    }

    let statuses: Vec<EvalStatus> = criteria
        .children
        .iter()
        .map(|child| evaluate_node(child, definition_id, evaluator, ctx))
        .collect();

    combine(criteria.operator, &statuses).negate_if(criteria.negate)
}

/// 자식 상태를 연산자 규칙으로 결합합니다.
pub fn combine(operator: CriteriaOperator, statuses: &[EvalStatus]) -> EvalStatus {
    let any = |wanted: EvalStatus| statuses.iter().any(|s| *s == wanted);
    let undecided = statuses
        .iter()
        .any(|s| matches!(s, EvalStatus::Unknown | EvalStatus::NotEvaluated));

    let (dominant, fallback) = match operator {
        CriteriaOperator::And => (EvalStatus::False, EvalStatus::True),
        CriteriaOperator::Or => (EvalStatus::True, EvalStatus::False),
    };

    if any(dominant) {
        dominant
    } else if any(EvalStatus::Error) {
        EvalStatus::Error
    } else if undecided {
        EvalStatus::Unknown
    } else {
        fallback
    }
}

fn evaluate_node<I: SystemInventory>(
    node: &CriteriaNode,
    definition_id: &str,
    evaluator: &OvalEvaluator<I>,
    ctx: &EvalContext,
) -> EvalStatus {
    match node {
        CriteriaNode::Criteria(nested) => evaluate(nested, definition_id, evaluator, ctx),
        CriteriaNode::Criterion(criterion) => {
            evaluate_criterion(criterion, definition_id, evaluator, ctx).negate_if(criterion.negate)
        }
        CriteriaNode::ExtendDefinition(extend) => {
            evaluate_extend(extend, definition_id, evaluator, ctx).negate_if(extend.negate)
        }
    }
}

fn evaluate_criterion<I: SystemInventory>(
    criterion: &Criterion,
    definition_id: &str,
    evaluator: &OvalEvaluator<I>,
    ctx: &EvalContext,
) -> EvalStatus {
    let Some(test) = evaluator.registry().lookup_test(&criterion.test_ref) else {
        warn!(
            definition_id,
            test_ref = %criterion.test_ref,
            "criterion references unknown test"
        );
        ctx.record_error(
            definition_id,
            format!("unresolved test reference: {}", criterion.test_ref),
        );
        return EvalStatus::Error;
    };

    match test.evaluate(evaluator.registry(), evaluator.inventory()) {
        Ok(result) => {
            debug!(definition_id, test_ref = %criterion.test_ref, result, "test evaluated");
            EvalStatus::from_bool(result)
        }
        Err(e) => {
            debug!(definition_id, test_ref = %criterion.test_ref, error = %e, "test failed");
            ctx.record_error(
                definition_id,
                format!("test {} could not be evaluated: {e}", criterion.test_ref),
            );
            EvalStatus::Error
        }
    }
}

fn evaluate_extend<I: SystemInventory>(
    extend: &ExtendDefinition,
    definition_id: &str,
    evaluator: &OvalEvaluator<I>,
    ctx: &EvalContext,
) -> EvalStatus {
    match evaluator.registry().lookup_definition(&extend.definition_ref) {
        Some(definition) => evaluator.evaluate_nested(definition, ctx),
        None => {
            warn!(
                definition_id,
                definition_ref = %extend.definition_ref,
                "extend_definition references unknown definition"
            );
            ctx.record_error(
                definition_id,
                format!("unresolved definition reference: {}", extend.definition_ref),
            );
            EvalStatus::Error
        }
    }
}
