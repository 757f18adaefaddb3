//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 엔진은 이 상수를 사용하여 `metrics::counter!()` 매크로를 호출합니다.
//! 레코더가 설치되지 않은 경우 모든 호출은 no-op입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `ovalguard_`
//! - 모듈명: `oval_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(ovalguard_core::metrics::OVAL_EVR_COMPARISONS_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 평가 상태 레이블 키 (true, false, error, unknown, not_evaluated)
pub const LABEL_STATUS: &str = "status";

/// 엔티티 종류 레이블 키 (rpminfo, dpkginfo, textfilecontent54)
pub const LABEL_KIND: &str = "kind";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── OVAL 엔진 메트릭 ───────────────────────────────────────────────

/// OVAL: 평가 완료된 정의 수 (counter, label: status)
pub const OVAL_DEFINITIONS_EVALUATED_TOTAL: &str = "ovalguard_oval_definitions_evaluated_total";

/// OVAL: 캐시된 결과를 재사용한 정의 평가 수 (counter)
pub const OVAL_DEFINITIONS_CACHED_TOTAL: &str = "ovalguard_oval_definitions_cached_total";

/// OVAL: 평가된 테스트 수 (counter, labels: kind, result)
pub const OVAL_TESTS_EVALUATED_TOTAL: &str = "ovalguard_oval_tests_evaluated_total";

/// OVAL: EVR 비교 수 (counter, label: result)
pub const OVAL_EVR_COMPARISONS_TOTAL: &str = "ovalguard_oval_evr_comparisons_total";

/// OVAL: 기록된 진단 메시지 수 (counter)
pub const OVAL_DIAGNOSTICS_RECORDED_TOTAL: &str = "ovalguard_oval_diagnostics_recorded_total";

/// OVAL: 정의 하나의 평가 소요 시간 (histogram, 초)
pub const OVAL_EVALUATION_DURATION_SECONDS: &str = "ovalguard_oval_evaluation_duration_seconds";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        OVAL_DEFINITIONS_EVALUATED_TOTAL,
        "Total number of OVAL definitions evaluated, by final status"
    );
    describe_counter!(
        OVAL_DEFINITIONS_CACHED_TOTAL,
        "Total number of definition evaluations served from a finalized outcome"
    );
    describe_counter!(
        OVAL_TESTS_EVALUATED_TOTAL,
        "Total number of OVAL tests evaluated, by kind and result"
    );
    describe_counter!(
        OVAL_EVR_COMPARISONS_TOTAL,
        "Total number of epoch:version-release comparisons performed"
    );
    describe_counter!(
        OVAL_DIAGNOSTICS_RECORDED_TOTAL,
        "Total number of diagnostic messages recorded during evaluation"
    );
    describe_histogram!(
        OVAL_EVALUATION_DURATION_SECONDS,
        "Time to evaluate a single top-level definition in seconds"
    );
}
