//! 정의 평가기
//!
//! [`OvalEvaluator`]는 레지스트리와 인벤토리를 공유하며 정의 하나를 평가합니다.
//!
//! # 동시성
//!
//! - 정의마다 잠금 하나가 평가 전체(중첩 extend_definition 포함)를 감쌉니다.
//! - 같은 정의에 대한 동시 요청은 직렬화되고, 뒤에 온 요청은 확정된 결과를 재사용합니다.
//! - 상태는 잠금을 잡은 상태에서만 기록됩니다.
//! - extend_definition 순환에 속한 정의는 트리를 걷지 않고 `Error`가 되므로 교착이 없습니다.
//!
//! 잠금은 `std::sync::Mutex`이며 `.await`를 가로질러 잡지 않으므로
//! 일반 스레드와 async 태스크 어디서든 호출할 수 있습니다. 인벤토리 조회가 오래 걸리면
//! `tokio::task::spawn_blocking`으로 옮기는 편이 런타임 워커를 덜 붙잡습니다.
//!
//! # 사용 예시
//!
//! ```
//! use std::sync::Arc;
//!
//! use ovalguard_oval_engine::{EngineConfig, OvalEvaluator, Registry, StaticInventory, EvalStatus};
//!
//! let registry = Registry::from_json(r#"{
//!     "definitions": [ { "id": "oval:def:1", "criteria": { "children": [
//!         { "type": "criterion", "test_ref": "oval:tst:1" }
//!     ] } } ],
//!     "tests": { "rpminfo_tests": [ { "id": "oval:tst:1", "object_ref": "oval:obj:1" } ] },
//!     "objects": { "rpminfo_objects": [ { "id": "oval:obj:1", "name": "bash" } ] }
//! }"#).unwrap();
//! let inventory = StaticInventory::from_json(r#"{
//!     "rpm_packages": [ { "name": "bash", "evr": "0:5.1.8-6.el9" } ]
//! }"#).unwrap();
//!
//! let evaluator = OvalEvaluator::new(Arc::new(registry), Arc::new(inventory), EngineConfig::default());
//! let result = evaluator.evaluate_by_id("oval:def:1", None).unwrap();
//! assert_eq!(result.status, EvalStatus::True);
//! ```

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use ovalguard_core::metrics::{
    LABEL_STATUS, OVAL_DEFINITIONS_CACHED_TOTAL, OVAL_DEFINITIONS_EVALUATED_TOTAL,
    OVAL_EVALUATION_DURATION_SECONDS,
};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::context::EvalContext;
use crate::criteria;
use crate::error::OvalEngineError;
use crate::inventory::SystemInventory;
use crate::model::Definition;
use crate::model::definition::DefinitionOutcome;
use crate::registry::Registry;
use crate::result::{EvaluationResult, ResultSender};
use crate::types::EvalStatus;

/// 정의 평가기
///
/// `Send + Sync`이므로 `Arc`로 감싸 여러 스레드에서 공유할 수 있습니다.
pub struct OvalEvaluator<I> {
    registry: Arc<Registry>,
    inventory: Arc<I>,
    config: EngineConfig,
}

impl<I: SystemInventory> OvalEvaluator<I> {
    /// 새 평가기를 생성합니다.
    pub fn new(registry: Arc<Registry>, inventory: Arc<I>, config: EngineConfig) -> Self {
        Self {
            registry,
            inventory,
            config,
        }
    }

    /// 레지스트리를 반환합니다.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// 인벤토리를 반환합니다.
    pub fn inventory(&self) -> &I {
        &self.inventory
    }

    /// 엔진 설정을 반환합니다.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 최상위 정의 하나를 평가합니다.
    ///
    /// 결과 레코드는 `sink`가 주어지면 전달되고(실패는 로그만 남김) 항상 반환됩니다.
    pub fn evaluate(&self, definition: &Definition, sink: Option<&ResultSender>) -> EvaluationResult {
        let started = Instant::now();
        let ctx = EvalContext::with_limit(self.config.max_diagnostics);
        let status = self.evaluate_nested(definition, &ctx);
        let diagnostics = ctx.finish();

        counter!(OVAL_DEFINITIONS_EVALUATED_TOTAL, LABEL_STATUS => status.as_str()).increment(1);
        histogram!(OVAL_EVALUATION_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

        let result = EvaluationResult::new(&definition.id, definition.title(), status, diagnostics);
        debug!(
            definition_id = %definition.id,
            status = %status,
            diagnostics = result.diagnostics.len(),
            "definition evaluated"
        );

        if let Some(sink) = sink
            && let Err(e) = sink.send(result.clone())
        {
            warn!(
                definition_id = %definition.id,
                error = %e,
                "failed to deliver evaluation result, receiver dropped"
            );
        }

        result
    }

    /// 식별자로 정의를 찾아 평가합니다.
    ///
    /// # Errors
    ///
    /// 정의가 없으면 `OvalEngineError::DanglingReference`
    pub fn evaluate_by_id(
        &self,
        definition_id: &str,
        sink: Option<&ResultSender>,
    ) -> Result<EvaluationResult, OvalEngineError> {
        let definition = self.registry.lookup_definition(definition_id).ok_or_else(|| {
            OvalEngineError::DanglingReference {
                entity: "definition",
                id: definition_id.to_owned(),
            }
        })?;
        Ok(self.evaluate(definition, sink))
    }

    /// 레지스트리의 모든 정의를 문서 순서대로 평가합니다.
    pub fn evaluate_all(&self, sink: Option<&ResultSender>) -> Vec<EvaluationResult> {
        self.registry
            .definitions()
            .map(|definition| self.evaluate(definition, sink))
            .collect()
    }

    /// 모든 정의의 확정 결과를 지웁니다.
    ///
    /// 진행 중인 평가가 있으면 끝날 때까지 기다립니다.
    pub fn reset(&self) {
        for definition in self.registry.definitions() {
            *definition.lock_outcome() = None;
        }
        debug!(
            definitions = self.registry.definition_count(),
            "evaluation outcomes cleared"
        );
    }

    /// 정의 잠금을 잡고 상태를 계산합니다. 진단은 `ctx`로 전달됩니다.
    ///
    /// extend_definition 리프도 이 경로로 들어오며, 결과 싱크 없이 상태만 돌려줍니다.
    pub(crate) fn evaluate_nested(&self, definition: &Definition, ctx: &EvalContext) -> EvalStatus {
        let mut outcome = definition.lock_outcome();

        if self.config.cache_results
            && let Some(done) = outcome.as_ref()
        {
            counter!(OVAL_DEFINITIONS_CACHED_TOTAL).increment(1);
            ctx.merge(&done.diagnostics);
            return done.status;
        }

        // 제한은 최상위 컨텍스트에서만 적용
        let local = EvalContext::new();
        let status = if self.registry.is_cyclic(&definition.id) {
            let err = OvalEngineError::ExtendCycle {
                id: definition.id.clone(),
            };
            local.record_error(&definition.id, err.to_string());
            EvalStatus::Error
        } else {
            criteria::evaluate(&definition.criteria, &definition.id, self, &local)
        };

        let diagnostics = local.finish();
        ctx.merge(&diagnostics);
        *outcome = Some(DefinitionOutcome {
            status,
            diagnostics,
        });
        status
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::config::EngineConfigBuilder;
    use crate::inventory::{InstalledPackage, StaticInventory};
    use crate::model::{Criteria, CriteriaNode, OvalDocument, OvalTest, PackageObject};
    use crate::result::DiagnosticLevel;
    use crate::types::PackageFormat;

    /// 패키지 조회 횟수를 세는 인벤토리
    struct CountingInventory {
        inner: StaticInventory,
        package_lookups: AtomicUsize,
    }

    impl SystemInventory for CountingInventory {
        fn installed_packages(
            &self,
            format: PackageFormat,
            name: &str,
        ) -> Result<Vec<InstalledPackage>, OvalEngineError> {
            self.package_lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.installed_packages(format, name)
        }

        fn file_content(&self, path: &str) -> Result<Option<String>, OvalEngineError> {
            self.inner.file_content(path)
        }
    }

    /// "present" 테스트는 참, "absent" 테스트는 거짓
    fn base_document() -> OvalDocument {
        let mut doc = OvalDocument::default();
        doc.tests
            .rpminfo_tests
            .push(OvalTest::new("present", "obj:present"));
        doc.tests
            .rpminfo_tests
            .push(OvalTest::new("absent", "obj:absent"));
        doc.objects
            .rpminfo_objects
            .push(PackageObject::new("obj:present", "bash"));
        doc.objects
            .rpminfo_objects
            .push(PackageObject::new("obj:absent", "telnet"));
        doc
    }

    fn evaluator_with(
        definitions: Vec<Definition>,
        config: EngineConfig,
    ) -> OvalEvaluator<CountingInventory> {
        let mut doc = base_document();
        doc.definitions = definitions;
        let inventory = CountingInventory {
            inner: StaticInventory::new()
                .with_package(PackageFormat::Rpm, InstalledPackage::new("bash", "0:5.1.8-6.el9")),
            package_lookups: AtomicUsize::new(0),
        };
        OvalEvaluator::new(Arc::new(Registry::new(doc)), Arc::new(inventory), config)
    }

    fn def(id: &str, criteria: Criteria) -> Definition {
        Definition::new(id, id, criteria)
    }

    #[test]
    fn simple_and_or() {
        let evaluator = evaluator_with(
            vec![
                def(
                    "and",
                    Criteria::and(vec![
                        CriteriaNode::criterion("present"),
                        CriteriaNode::criterion("absent"),
                    ]),
                ),
                def(
                    "or",
                    Criteria::or(vec![
                        CriteriaNode::criterion("present"),
                        CriteriaNode::criterion("absent"),
                    ]),
                ),
                def(
                    "negated",
                    Criteria::and(vec![CriteriaNode::criterion("absent").negated()]),
                ),
            ],
            EngineConfig::default(),
        );

        assert_eq!(evaluator.evaluate_by_id("and", None).unwrap().status, EvalStatus::False);
        assert_eq!(evaluator.evaluate_by_id("or", None).unwrap().status, EvalStatus::True);
        assert_eq!(
            evaluator.evaluate_by_id("negated", None).unwrap().status,
            EvalStatus::True
        );
    }

    #[test]
    fn dangling_test_reference_is_error_and_siblings_continue() {
        let evaluator = evaluator_with(
            vec![
                def(
                    "and",
                    Criteria::and(vec![
                        CriteriaNode::criterion("missing"),
                        CriteriaNode::criterion("present"),
                    ]),
                ),
                def(
                    "or",
                    Criteria::or(vec![
                        CriteriaNode::criterion("missing"),
                        CriteriaNode::criterion("present"),
                    ]),
                ),
            ],
            EngineConfig::default(),
        );

        let and = evaluator.evaluate_by_id("and", None).unwrap();
        assert_eq!(and.status, EvalStatus::Error);
        assert_eq!(and.error_count(), 1);
        assert!(and.diagnostics[0].message.contains("missing"));

        let or = evaluator.evaluate_by_id("or", None).unwrap();
        assert_eq!(or.status, EvalStatus::True);
        assert_eq!(or.error_count(), 1);
    }

    #[test]
    fn empty_criteria_is_unknown_with_warning() {
        let evaluator = evaluator_with(vec![def("empty", Criteria::default())], EngineConfig::default());
        let result = evaluator.evaluate_by_id("empty", None).unwrap();
        assert_eq!(result.status, EvalStatus::Unknown);
        assert_eq!(result.warning_count(), 1);
    }

    #[test]
    fn extend_definition_composes_and_negates() {
        let evaluator = evaluator_with(
            vec![
                def("base", Criteria::and(vec![CriteriaNode::criterion("present")])),
                def(
                    "uses_base",
                    Criteria::and(vec![
                        CriteriaNode::extend("base"),
                        CriteriaNode::criterion("present"),
                    ]),
                ),
                def(
                    "negates_base",
                    Criteria::and(vec![CriteriaNode::extend("base").negated()]),
                ),
            ],
            EngineConfig::default(),
        );

        assert_eq!(
            evaluator.evaluate_by_id("uses_base", None).unwrap().status,
            EvalStatus::True
        );
        assert_eq!(
            evaluator.evaluate_by_id("negates_base", None).unwrap().status,
            EvalStatus::False
        );
        // 중첩 평가도 결과를 확정함
        let base = evaluator.registry().lookup_definition("base").unwrap();
        assert_eq!(base.status(), EvalStatus::True);
    }

    #[test]
    fn dangling_extend_is_error() {
        let evaluator = evaluator_with(
            vec![def("a", Criteria::and(vec![CriteriaNode::extend("nowhere")]))],
            EngineConfig::default(),
        );
        let result = evaluator.evaluate_by_id("a", None).unwrap();
        assert_eq!(result.status, EvalStatus::Error);
        assert!(result.diagnostics[0].message.contains("nowhere"));
    }

    #[test]
    fn unknown_definition_id_is_dangling_reference() {
        let evaluator = evaluator_with(vec![], EngineConfig::default());
        let err = evaluator.evaluate_by_id("oval:def:404", None).unwrap_err();
        assert!(matches!(
            err,
            OvalEngineError::DanglingReference { entity: "definition", .. }
        ));
    }

    #[test]
    fn extend_cycle_evaluates_to_error_without_hanging() {
        let evaluator = evaluator_with(
            vec![
                def("a", Criteria::and(vec![CriteriaNode::extend("b")])),
                def("b", Criteria::and(vec![CriteriaNode::extend("a")])),
                def(
                    "outside",
                    Criteria::or(vec![
                        CriteriaNode::extend("a"),
                        CriteriaNode::criterion("present"),
                    ]),
                ),
            ],
            EngineConfig::default(),
        );

        let a = evaluator.evaluate_by_id("a", None).unwrap();
        assert_eq!(a.status, EvalStatus::Error);
        assert!(a.diagnostics[0].message.contains("cycle"));

        let outside = evaluator.evaluate_by_id("outside", None).unwrap();
        assert_eq!(outside.status, EvalStatus::True);
        assert_eq!(outside.error_count(), 1);
    }

    #[test]
    fn cached_outcome_is_reused_and_replays_diagnostics() {
        let evaluator = evaluator_with(
            vec![
                def(
                    "flaky",
                    Criteria::or(vec![
                        CriteriaNode::criterion("missing"),
                        CriteriaNode::criterion("present"),
                    ]),
                ),
                def("parent", Criteria::and(vec![CriteriaNode::extend("flaky")])),
            ],
            EngineConfig::default(),
        );

        let first = evaluator.evaluate_by_id("flaky", None).unwrap();
        let lookups = evaluator.inventory().package_lookups.load(Ordering::SeqCst);
        assert_eq!(lookups, 1);

        let second = evaluator.evaluate_by_id("flaky", None).unwrap();
        assert_eq!(second.status, first.status);
        assert_eq!(second.diagnostics, first.diagnostics);

        let parent = evaluator.evaluate_by_id("parent", None).unwrap();
        assert_eq!(parent.status, EvalStatus::True);
        assert_eq!(parent.diagnostics, first.diagnostics);

        // 재평가 없음
        assert_eq!(evaluator.inventory().package_lookups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn disabled_cache_recomputes() {
        let config = EngineConfigBuilder::new().cache_results(false).build().unwrap();
        let evaluator = evaluator_with(
            vec![def("a", Criteria::and(vec![CriteriaNode::criterion("present")]))],
            config,
        );
        evaluator.evaluate_by_id("a", None).unwrap();
        evaluator.evaluate_by_id("a", None).unwrap();
        assert_eq!(evaluator.inventory().package_lookups.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn reset_clears_outcomes() {
        let evaluator = evaluator_with(
            vec![def("a", Criteria::and(vec![CriteriaNode::criterion("present")]))],
            EngineConfig::default(),
        );
        evaluator.evaluate_by_id("a", None).unwrap();
        let definition = evaluator.registry().lookup_definition("a").unwrap();
        assert_eq!(definition.status(), EvalStatus::True);

        evaluator.reset();
        assert_eq!(definition.status(), EvalStatus::NotEvaluated);

        evaluator.evaluate_by_id("a", None).unwrap();
        assert_eq!(evaluator.inventory().package_lookups.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn result_is_delivered_to_sink() {
        let evaluator = evaluator_with(
            vec![def("a", Criteria::and(vec![CriteriaNode::criterion("present")]))],
            EngineConfig::default(),
        );
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let returned = evaluator.evaluate_by_id("a", Some(&tx)).unwrap();

        let delivered = rx.try_recv().unwrap();
        assert_eq!(delivered.id, returned.id);
        assert_eq!(delivered.status, EvalStatus::True);
        // extend 경로는 싱크로 전송하지 않으므로 하나만 도착
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_sink_does_not_fail_evaluation() {
        let evaluator = evaluator_with(
            vec![def("a", Criteria::and(vec![CriteriaNode::criterion("present")]))],
            EngineConfig::default(),
        );
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        let result = evaluator.evaluate_by_id("a", Some(&tx)).unwrap();
        assert_eq!(result.status, EvalStatus::True);
    }

    #[test]
    fn max_diagnostics_truncates_result() {
        let config = EngineConfigBuilder::new().max_diagnostics(2).build().unwrap();
        let children = (0..5)
            .map(|i| CriteriaNode::criterion(format!("missing-{i}")))
            .collect();
        let evaluator = evaluator_with(vec![def("noisy", Criteria::and(children))], config);

        let result = evaluator.evaluate_by_id("noisy", None).unwrap();
        assert_eq!(result.status, EvalStatus::Error);
        assert_eq!(result.diagnostics.len(), 3);
        assert_eq!(result.diagnostics[2].level, DiagnosticLevel::Warning);
    }

    fn diamond_definitions() -> Vec<Definition> {
        vec![
            def(
                "top",
                Criteria::and(vec![CriteriaNode::extend("shared"), CriteriaNode::extend("middle")]),
            ),
            def("middle", Criteria::and(vec![CriteriaNode::extend("shared")])),
            def(
                "shared",
                Criteria::or(vec![
                    CriteriaNode::criterion("missing"),
                    CriteriaNode::criterion("present"),
                ]),
            ),
        ]
    }

    #[test]
    fn diamond_extend_reports_shared_diagnostics_once() {
        for cache_results in [true, false] {
            let config = EngineConfigBuilder::new()
                .cache_results(cache_results)
                .build()
                .unwrap();
            let evaluator = evaluator_with(diamond_definitions(), config);

            let result = evaluator.evaluate_by_id("top", None).unwrap();
            assert_eq!(result.status, EvalStatus::True);
            assert_eq!(result.diagnostics.len(), 1, "cache_results={cache_results}");
            assert_eq!(result.diagnostics[0].definition_id, "shared");

            // 중간 정의 자체의 결과에는 공유 정의 진단이 그대로 남음
            let middle = evaluator.evaluate_by_id("middle", None).unwrap();
            assert_eq!(middle.diagnostics.len(), 1);
        }
    }

    #[test]
    fn diamond_after_cached_children_reports_once() {
        let evaluator = evaluator_with(diamond_definitions(), EngineConfig::default());
        evaluator.evaluate_by_id("middle", None).unwrap();
        evaluator.evaluate_by_id("shared", None).unwrap();

        let result = evaluator.evaluate_by_id("top", None).unwrap();
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.error_count(), 1);
    }

    #[tokio::test]
    async fn evaluates_directly_inside_async_task() {
        let evaluator = evaluator_with(diamond_definitions(), EngineConfig::default());

        let result = evaluator.evaluate_by_id("top", None).unwrap();
        assert_eq!(result.status, EvalStatus::True);

        let shared = evaluator.registry().lookup_definition("shared").unwrap();
        assert_eq!(shared.status(), EvalStatus::True);

        evaluator.reset();
        assert_eq!(shared.status(), EvalStatus::NotEvaluated);
    }

    #[test]
    fn concurrent_evaluations_agree_and_run_once() {
        let evaluator = Arc::new(evaluator_with(
            vec![
                def("shared", Criteria::and(vec![CriteriaNode::criterion("present")])),
                def("p1", Criteria::and(vec![CriteriaNode::extend("shared")])),
                def("p2", Criteria::or(vec![CriteriaNode::extend("shared")])),
            ],
            EngineConfig::default(),
        ));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let evaluator = Arc::clone(&evaluator);
                let id = ["shared", "p1", "p2"][i % 3];
                std::thread::spawn(move || evaluator.evaluate_by_id(id, None).unwrap().status)
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), EvalStatus::True);
        }
        assert_eq!(evaluator.inventory().package_lookups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn evaluator_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<OvalEvaluator<StaticInventory>>();
    }
}
