//! 리프 테스트 평가
//!
//! 테스트 하나를 평가해 참/거짓을 돌려줍니다. 순서는 다음과 같습니다.
//!
//! 1. 오브젝트와 스테이트 참조를 해석하고 종류가 테스트와 같은지 확인
//! 2. 인벤토리에서 항목(item) 수집
//!    - rpminfo / dpkginfo: 이름이 같은 설치 패키지
//!    - textfilecontent54: 파일 내용에 대한 패턴 매치 (첫 캡처 그룹, 없으면 전체 매치)
//! 3. `check_existence`로 항목 개수 확인. 스테이트나 항목이 없으면 이 결과가 곧 테스트 결과
//! 4. 항목별로 모든 스테이트를 AND하고 `check` 모드로 결합

use metrics::counter;
use ovalguard_core::metrics::{LABEL_KIND, LABEL_RESULT, OVAL_TESTS_EVALUATED_TOTAL};
use regex::Regex;
use tracing::debug;

use crate::error::OvalEngineError;
use crate::evr::compare_evr;
use crate::inventory::{InstalledPackage, SystemInventory};
use crate::model::{
    ObjectRef, OvalEntity, PackageState, StateRef, TestRef, TextFileContentObject,
    TextFileContentState,
};
use crate::registry::Registry;
use crate::types::{PackageFormat, TextOperation};

/// 오브젝트가 수집한 항목
#[derive(Debug, Clone)]
enum Item {
    Package(InstalledPackage),
    Text(String),
}

impl TestRef<'_> {
    /// 테스트를 평가합니다.
    ///
    /// # Errors
    ///
    /// 참조 해석 실패, 종류 불일치, EVR 비교 실패, 정규식 오류, 인벤토리 조회 실패
    pub fn evaluate<I>(&self, registry: &Registry, inventory: &I) -> Result<bool, OvalEngineError>
    where
        I: SystemInventory + ?Sized,
    {
        let result = evaluate_test(*self, registry, inventory);
        let label = if result.is_ok() { "success" } else { "failure" };
        counter!(
            OVAL_TESTS_EVALUATED_TOTAL,
            LABEL_KIND => self.kind().as_str(),
            LABEL_RESULT => label
        )
        .increment(1);
        result
    }
}

fn evaluate_test<I>(
    test: TestRef<'_>,
    registry: &Registry,
    inventory: &I,
) -> Result<bool, OvalEngineError>
where
    I: SystemInventory + ?Sized,
{
    let spec = test.test();

    let object = registry
        .lookup_object(&spec.object_ref)
        .ok_or_else(|| OvalEngineError::DanglingReference {
            entity: "object",
            id: spec.object_ref.clone(),
        })?;
    ensure_same_kind(test, "object", &object)?;

    let states = spec
        .state_refs
        .iter()
        .map(|state_ref| {
            let state =
                registry
                    .lookup_state(state_ref)
                    .ok_or_else(|| OvalEngineError::DanglingReference {
                        entity: "state",
                        id: state_ref.clone(),
                    })?;
            ensure_same_kind(test, "state", &state)?;
            Ok(state)
        })
        .collect::<Result<Vec<_>, OvalEngineError>>()?;

    let items = collect_items(object, inventory)?;
    let exists = spec.check_existence.is_satisfied(items.len());

    debug!(
        test_id = %spec.id,
        kind = %test.kind(),
        items = items.len(),
        states = states.len(),
        exists,
        "test items collected"
    );

    if !exists || states.is_empty() || items.is_empty() {
        return Ok(exists);
    }

    let mut item_results = Vec::with_capacity(items.len());
    for item in &items {
        let mut satisfied = true;
        for state in &states {
            // 모든 스테이트를 평가해 오류가 묻히지 않도록 함
            satisfied &= state_matches(*state, item)?;
        }
        item_results.push(satisfied);
    }

    Ok(spec.check.combine(&item_results))
}

fn ensure_same_kind(
    test: TestRef<'_>,
    entity: &'static str,
    other: &impl OvalEntity,
) -> Result<(), OvalEngineError> {
    if test.kind() == other.kind() {
        Ok(())
    } else {
        Err(OvalEngineError::KindMismatch {
            test_id: test.id().to_owned(),
            entity,
            id: other.id().to_owned(),
            expected: test.kind(),
            actual: other.kind(),
        })
    }
}

fn collect_items<I>(object: ObjectRef<'_>, inventory: &I) -> Result<Vec<Item>, OvalEngineError>
where
    I: SystemInventory + ?Sized,
{
    let items = match object {
        ObjectRef::RpmInfo(o) => inventory
            .installed_packages(PackageFormat::Rpm, &o.name)?
            .into_iter()
            .map(Item::Package)
            .collect(),
        ObjectRef::DpkgInfo(o) => inventory
            .installed_packages(PackageFormat::Dpkg, &o.name)?
            .into_iter()
            .map(Item::Package)
            .collect(),
        ObjectRef::TextFileContent54(o) => match inventory.file_content(&o.filepath)? {
            Some(content) => text_matches(o, &content)?
                .into_iter()
                .map(Item::Text)
                .collect(),
            None => Vec::new(),
        },
    };
    Ok(items)
}

fn text_matches(
    object: &TextFileContentObject,
    content: &str,
) -> Result<Vec<String>, OvalEngineError> {
    let regex = compile(&object.pattern)?;
    let mut matches = regex.captures_iter(content).filter_map(|caps| {
        caps.get(1)
            .or_else(|| caps.get(0))
            .map(|m| m.as_str().to_owned())
    });

    match object.instance {
        None => Ok(matches.collect()),
        Some(0) => Err(OvalEngineError::InvalidEntity {
            entity: "object",
            id: object.id.clone(),
            reason: "instance is 1-based and must be at least 1".to_owned(),
        }),
        Some(n) => Ok(matches.nth(n - 1).into_iter().collect()),
    }
}

fn state_matches(state: StateRef<'_>, item: &Item) -> Result<bool, OvalEngineError> {
    match (state, item) {
        (StateRef::RpmInfo(s) | StateRef::DpkgInfo(s), Item::Package(p)) => package_matches(s, p),
        (StateRef::TextFileContent54(s), Item::Text(value)) => text_state_matches(s, value),
        (state, _) => Err(OvalEngineError::InvalidEntity {
            entity: "state",
            id: state.id().to_owned(),
            reason: "state cannot be applied to the collected item".to_owned(),
        }),
    }
}

fn package_matches(state: &PackageState, package: &InstalledPackage) -> Result<bool, OvalEngineError> {
    if let Some(arch) = &state.arch
        && package.arch.as_deref() != Some(arch.as_str())
    {
        return Ok(false);
    }

    match &state.evr {
        Some(requirement) => Ok(compare_evr(
            &requirement.operation,
            &package.evr,
            &requirement.value,
        )?),
        None => Ok(true),
    }
}

fn text_state_matches(state: &TextFileContentState, value: &str) -> Result<bool, OvalEngineError> {
    let Some(requirement) = &state.subexpression else {
        return Ok(true);
    };

    match &requirement.operation {
        TextOperation::Equals => Ok(value == requirement.value),
        TextOperation::NotEqual => Ok(value != requirement.value),
        TextOperation::PatternMatch => Ok(compile(&requirement.value)?.is_match(value)),
        TextOperation::Unknown(raw) => Err(OvalEngineError::UnknownOperation {
            operation: raw.clone(),
        }),
    }
}

fn compile(pattern: &str) -> Result<Regex, OvalEngineError> {
    Regex::new(pattern).map_err(|e| OvalEngineError::Pattern {
        pattern: pattern.to_owned(),
        reason: e.to_string(),
    })
}
