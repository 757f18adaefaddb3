//! 평가 컨텍스트 -- 진단 메시지 수집
//!
//! 최상위 평가 한 번마다 [`EvalContext`]를 하나 만듭니다.
//! 기록은 공유 참조(`&self`)로 어느 깊이, 어느 스레드에서든 가능하며 절대 블로킹하지 않습니다.
//! [`EvalContext::finish`]는 컨텍스트를 소비하므로 어떤 생산자도 수집 이후까지 살아남지 못합니다.
//!
//! 중첩 정의의 진단은 [`EvalContext::merge`]로 합치며, 정의 하나의 진단은
//! 컨텍스트마다 한 번만 들어갑니다.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use metrics::counter;
use ovalguard_core::metrics::OVAL_DIAGNOSTICS_RECORDED_TOTAL;
use tokio::sync::mpsc;
use tracing::warn;

use crate::result::Diagnostic;

/// 진단 메시지 큐
#[derive(Debug)]
pub struct EvalContext {
    tx: mpsc::UnboundedSender<Diagnostic>,
    rx: mpsc::UnboundedReceiver<Diagnostic>,
    max_diagnostics: usize,
    merged: Mutex<HashSet<String>>,
}

impl EvalContext {
    /// 보관 개수 제한이 없는 컨텍스트를 생성합니다.
    pub fn new() -> Self {
        Self::with_limit(usize::MAX)
    }

    /// 처음 `max_diagnostics`개만 보관하는 컨텍스트를 생성합니다.
    ///
    /// 초과분은 [`finish`](Self::finish)에서 버려지고, 버려진 개수를 알리는 경고 하나가 덧붙습니다.
    pub fn with_limit(max_diagnostics: usize) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            max_diagnostics,
            merged: Mutex::new(HashSet::new()),
        }
    }

    /// 진단 메시지를 기록합니다.
    pub fn record(&self, diagnostic: Diagnostic) {
        counter!(OVAL_DIAGNOSTICS_RECORDED_TOTAL).increment(1);
        if let Err(e) = self.tx.send(diagnostic) {
            // 수신단은 self가 소유하므로 도달하지 않음
            warn!(error = %e, "diagnostic queue closed, dropping message");
        }
    }

    /// 에러 진단을 기록합니다.
    pub fn record_error(&self, definition_id: &str, message: impl Into<String>) {
        self.record(Diagnostic::error(definition_id, message));
    }

    /// 경고 진단을 기록합니다.
    pub fn record_warning(&self, definition_id: &str, message: impl Into<String>) {
        self.record(Diagnostic::warning(definition_id, message));
    }

    /// 중첩 정의가 남긴 진단 목록을 합칩니다.
    ///
    /// 이미 합쳐진 정의의 진단은 건너뜁니다. 같은 정의에 여러 extend 경로로
    /// 도달해도(A->B, A->C->B) 그 진단은 한 번만 기록됩니다.
    pub fn merge(&self, diagnostics: &[Diagnostic]) {
        let mut merged = self.merged.lock().unwrap_or_else(PoisonError::into_inner);
        for diagnostic in diagnostics {
            if !merged.contains(&diagnostic.definition_id) {
                self.record(diagnostic.clone());
            }
        }
        merged.extend(diagnostics.iter().map(|d| d.definition_id.clone()));
    }

    /// 컨텍스트를 소비하고 기록 순서대로 진단 메시지를 반환합니다.
    pub fn finish(self) -> Vec<Diagnostic> {
        let Self {
            tx,
            mut rx,
            max_diagnostics,
            ..
        } = self;
        drop(tx);

        let mut diagnostics = Vec::new();
        let mut dropped = 0usize;
        while let Ok(diagnostic) = rx.try_recv() {
            if diagnostics.len() < max_diagnostics {
                diagnostics.push(diagnostic);
            } else {
                dropped += 1;
            }
        }

        if dropped > 0 {
            let definition_id = diagnostics
                .last()
                .map(|d| d.definition_id.clone())
                .unwrap_or_default();
            diagnostics.push(Diagnostic::warning(
                definition_id,
                format!("{dropped} further diagnostics dropped (limit {max_diagnostics})"),
            ));
        }

        diagnostics
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}
