//! EVR 비교기 -- `epoch:version-release` 문자열 비교
//!
//! RPM (`epoch:version-release`)과 DPKG (`epoch:upstream+revision`) 표기의
//! 패키지 버전을 비교합니다. 순수 함수이며 어떤 상태도 갖지 않습니다.
//!
//! # 비교 순서
//!
//! 1. epoch 정규화: `<숫자>:` 접두어가 없으면 `0:`을 붙입니다.
//! 2. 추출: 첫 `:`에서 epoch를, 나머지의 첫 `+`에서 version과 release를 분리합니다.
//! 3. epoch (부호 없는 정수), version, release 순으로 비교합니다.
//!
//! version과 release는 `-`로 나뉜 대시 구간을 앞에서부터 맞춰 비교하고,
//! 각 구간 안에서는 `.`으로 나뉜 점 구간을 비교합니다.
//! 두 점 구간이 모두 정수면 수치 비교를, 아니면 영숫자 비교를 사용합니다.
//!
//! # 사용 예시
//!
//! ```
//! use ovalguard_oval_engine::evr::compare_evr;
//! use ovalguard_oval_engine::types::EvrOperation;
//!
//! assert!(compare_evr(&EvrOperation::LessThan, "0:1.2-1", "0:1.10-1").unwrap());
//! assert!(compare_evr(&EvrOperation::Equals, "1.0-1", "0:1.0-1").unwrap());
//! ```

use std::borrow::Cow;
use std::cmp::Ordering;

use metrics::counter;
use ovalguard_core::metrics::{LABEL_RESULT, OVAL_EVR_COMPARISONS_TOTAL};
use tracing::trace;

use crate::error::EvrError;
use crate::types::EvrOperation;

/// 분리된 EVR 구성 요소
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evr<'a> {
    /// epoch (검증 전 원문)
    pub epoch: &'a str,
    /// version
    pub version: &'a str,
    /// release (없으면 빈 문자열)
    pub release: &'a str,
}

/// `<숫자>:` 접두어가 없으면 `0:`을 붙입니다.
pub fn normalize_epoch(evr: &str) -> Cow<'_, str> {
    let digits = evr.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 && evr.as_bytes().get(digits) == Some(&b':') {
        Cow::Borrowed(evr)
    } else {
        Cow::Owned(format!("0:{evr}"))
    }
}

/// EVR 문자열을 epoch / version / release로 분리합니다.
///
/// 첫 `:` 앞이 epoch, 나머지의 첫 `+` 앞이 version, 뒤가 release입니다.
/// `+`가 없으면 나머지 전체가 version이고 release는 비어 있습니다.
///
/// # Errors
///
/// `:`가 없으면 `EvrError::MissingEpoch`
pub fn evr_extract(evr: &str) -> Result<Evr<'_>, EvrError> {
    let (epoch, rest) = evr.split_once(':').ok_or_else(|| EvrError::MissingEpoch {
        input: evr.to_owned(),
    })?;
    let (version, release) = rest.split_once('+').unwrap_or((rest, ""));
    Ok(Evr {
        epoch,
        version,
        release,
    })
}

/// 두 EVR 문자열의 전체 순서를 계산합니다.
///
/// epoch, version, release 세 단계를 모두 계산한 뒤 사전식으로 결합합니다.
pub fn evr_ordering(actual: &str, expected: &str) -> Result<Ordering, EvrError> {
    let actual = normalize_epoch(actual);
    let expected = normalize_epoch(expected);
    let act = evr_extract(&actual)?;
    let chk = evr_extract(&expected)?;

    let epoch = compare_epoch(act.epoch, chk.epoch)?;
    let version = compare_version(act.version, chk.version)?;
    let release = compare_release(act.release, chk.release);

    trace!(
        actual = %actual,
        expected = %expected,
        ?epoch,
        ?version,
        ?release,
        "evr compared"
    );

    Ok(epoch.then(version).then(release))
}

/// `actual <operation> expected`를 평가합니다.
///
/// # Errors
///
/// - `EvrError::UnknownOperation`: 지원하지 않는 연산
/// - `EvrError::InvalidEpoch`: epoch가 부호 없는 정수가 아님
/// - `EvrError::EmptyVersion`: version이 비어 있음
pub fn compare_evr(
    operation: &EvrOperation,
    actual: &str,
    expected: &str,
) -> Result<bool, EvrError> {
    let result = evaluate_operation(operation, actual, expected);
    let label = if result.is_ok() { "success" } else { "failure" };
    counter!(OVAL_EVR_COMPARISONS_TOTAL, LABEL_RESULT => label).increment(1);
    result
}

fn evaluate_operation(
    operation: &EvrOperation,
    actual: &str,
    expected: &str,
) -> Result<bool, EvrError> {
    if let EvrOperation::Unknown(raw) = operation {
        return Err(EvrError::UnknownOperation {
            operation: raw.clone(),
        });
    }

    let ordering = evr_ordering(actual, expected)?;
    Ok(match operation {
        EvrOperation::LessThan => ordering == Ordering::Less,
        EvrOperation::LessThanOrEqual => ordering != Ordering::Greater,
        EvrOperation::Equals => ordering == Ordering::Equal,
        EvrOperation::NotEqual => ordering != Ordering::Equal,
        EvrOperation::GreaterThan => ordering == Ordering::Greater,
        EvrOperation::GreaterThanOrEqual => ordering != Ordering::Less,
        EvrOperation::Unknown(_) => false,
    })
}

fn compare_epoch(actual: &str, check: &str) -> Result<Ordering, EvrError> {
    let parse = |epoch: &str| {
        epoch.parse::<u64>().map_err(|_| EvrError::InvalidEpoch {
            epoch: epoch.to_owned(),
        })
    };
    Ok(parse(actual)?.cmp(&parse(check)?))
}

fn compare_version(actual: &str, check: &str) -> Result<Ordering, EvrError> {
    if actual.is_empty() || check.is_empty() {
        return Err(EvrError::EmptyVersion);
    }
    Ok(compare_dashed(actual, check))
}

fn compare_release(actual: &str, check: &str) -> Ordering {
    compare_dashed(release_or_zero(actual), release_or_zero(check))
}

/// 빈 release는 `0`으로 봅니다.
fn release_or_zero(release: &str) -> &str {
    if release.is_empty() { "0" } else { release }
}

/// 대시 구간을 앞에서부터 맞춰 비교합니다.
///
/// 한쪽에만 남은 대시 구간은 결과에 영향을 주지 않습니다.
/// 점 구간은 실제값 쪽을 기준으로 순회하며, 기대값 쪽에 대응 구간이 없으면
/// 실제값이 더 큰 것으로 판정합니다. 실제값 쪽이 먼저 끝나면 다음 대시 구간으로 넘어갑니다.
fn compare_dashed(actual: &str, check: &str) -> Ordering {
    for (act_dash, chk_dash) in actual.split('-').zip(check.split('-')) {
        let mut chk_dots = chk_dash.split('.');
        for act_dot in act_dash.split('.') {
            let Some(chk_dot) = chk_dots.next() else {
                return Ordering::Greater;
            };
            match compare_segment(act_dot, chk_dot) {
                Ordering::Equal => continue,
                decided => return decided,
            }
        }
    }
    Ordering::Equal
}

fn compare_segment(actual: &str, check: &str) -> Ordering {
    match (actual.parse::<u64>(), check.parse::<u64>()) {
        (Ok(a), Ok(c)) => a.cmp(&c),
        _ => compare_alphanumeric(actual, check),
    }
}

/// 정수로 해석할 수 없는 점 구간의 전순서
///
/// - 숫자 또는 영문자의 최장 연속 구간(run) 단위로 비교하며, 그 외 문자는 구분자입니다.
/// - `~`는 구간의 끝을 포함한 모든 것보다 앞섭니다.
/// - 숫자 run은 수치로 (선행 0 무시, 길이 제한 없음), 영문자 run은 바이트 순으로 비교합니다.
/// - 숫자 run이 영문자 run보다 큽니다.
/// - 한쪽의 run이 먼저 끝나면 run이 남은 쪽이 큽니다.
fn compare_alphanumeric(actual: &str, check: &str) -> Ordering {
    let mut act = actual.as_bytes();
    let mut chk = check.as_bytes();

    loop {
        act = skip_separators(act);
        chk = skip_separators(chk);

        match (act.first(), chk.first()) {
            (Some(b'~'), Some(b'~')) => {
                act = &act[1..];
                chk = &chk[1..];
                continue;
            }
            (Some(b'~'), _) => return Ordering::Less,
            (_, Some(b'~')) => return Ordering::Greater,
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(a), Some(c)) => {
                let act_digit = a.is_ascii_digit();
                let chk_digit = c.is_ascii_digit();
                if act_digit != chk_digit {
                    return if act_digit {
                        Ordering::Greater
                    } else {
                        Ordering::Less
                    };
                }

                let (act_run, act_rest) = split_run(act, act_digit);
                let (chk_run, chk_rest) = split_run(chk, chk_digit);
                let decided = if act_digit {
                    compare_digit_runs(act_run, chk_run)
                } else {
                    act_run.cmp(chk_run)
                };
                if decided != Ordering::Equal {
                    return decided;
                }
                act = act_rest;
                chk = chk_rest;
            }
        }
    }
}

fn skip_separators(s: &[u8]) -> &[u8] {
    let skip = s
        .iter()
        .take_while(|b| !b.is_ascii_alphanumeric() && **b != b'~')
        .count();
    &s[skip..]
}

fn split_run(s: &[u8], digits: bool) -> (&[u8], &[u8]) {
    let len = s
        .iter()
        .take_while(|b| {
            if digits {
                b.is_ascii_digit()
            } else {
                b.is_ascii_alphabetic()
            }
        })
        .count();
    s.split_at(len)
}

fn compare_digit_runs(a: &[u8], c: &[u8]) -> Ordering {
    let strip = |run: &[u8]| -> usize { run.iter().take_while(|b| **b == b'0').count() };
    let a = &a[strip(a)..];
    let c = &c[strip(c)..];
    a.len().cmp(&c.len()).then_with(|| a.cmp(c))
}
