// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Invocation profiling metrics.
//!
//! [`InvokeMetrics`] holds one [`OperatorMetrics`] slot per operator,
//! created when tensors are allocated. Recording during `invoke` only
//! updates those slots, so profiling never allocates on the hot path.

use std::time::Duration;

/// Timing for a single operator across invocations.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct OperatorMetrics {
    /// Position in execution order.
    pub node: usize,
    /// Kernel name.
    pub op: &'static str,
    /// Duration of the most recent execution.
    pub last: Duration,
    /// Sum over all recorded executions.
    pub total: Duration,
    /// Number of recorded executions.
    pub calls: u64,
}

impl OperatorMetrics {
    /// Mean execution time, or zero if never run.
    pub fn mean(&self) -> Duration {
        mean(self.total, self.calls)
    }
}

/// Aggregate metrics for an interpreter.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct InvokeMetrics {
    /// Whether per-operator timing is recorded.
    pub enabled: bool,
    /// Number of successful invocations.
    pub invocations: u64,
    /// Wall-clock time of the most recent invocation.
    pub last_invoke: Duration,
    /// Wall-clock time summed over all invocations.
    pub total_invoke: Duration,
    /// Per-operator slots, in execution order.
    pub operators: Vec<OperatorMetrics>,
}

impl InvokeMetrics {
    /// Creates one zeroed slot per operator name.
    pub fn new<I>(operators: I, enabled: bool) -> Self
    where
        I: IntoIterator<Item = &'static str>,
    {
        Self {
            enabled,
            invocations: 0,
            last_invoke: Duration::ZERO,
            total_invoke: Duration::ZERO,
            operators: operators
                .into_iter()
                .enumerate()
                .map(|(node, op)| OperatorMetrics {
                    node,
                    op,
                    last: Duration::ZERO,
                    total: Duration::ZERO,
                    calls: 0,
                })
                .collect(),
        }
    }

    /// Records one execution of operator `node`. Out-of-range nodes are ignored.
    pub fn record_operator(&mut self, node: usize, elapsed: Duration) {
        if let Some(slot) = self.operators.get_mut(node) {
            slot.last = elapsed;
            slot.total += elapsed;
            slot.calls += 1;
        }
    }

    /// Records the end of a successful invocation.
    pub fn finish_invoke(&mut self, elapsed: Duration) {
        self.invocations += 1;
        self.last_invoke = elapsed;
        self.total_invoke += elapsed;
    }

    /// Mean invocation time, or zero before the first invoke.
    pub fn mean_invoke(&self) -> Duration {
        mean(self.total_invoke, self.invocations)
    }

    /// The operator with the largest accumulated time.
    pub fn slowest_operator(&self) -> Option<&OperatorMetrics> {
        self.operators
            .iter()
            .filter(|m| m.calls > 0)
            .max_by_key(|m| m.total)
    }

    /// Zeroes every counter, keeping the slots.
    pub fn clear(&mut self) {
        self.invocations = 0;
        self.last_invoke = Duration::ZERO;
        self.total_invoke = Duration::ZERO;
        for slot in &mut self.operators {
            slot.last = Duration::ZERO;
            slot.total = Duration::ZERO;
            slot.calls = 0;
        }
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        let slowest = self
            .slowest_operator()
            .map(|m| format!(", slowest: #{} {} ({:.1?} mean)", m.node, m.op, m.mean()))
            .unwrap_or_default();
        format!(
            "Invoke: {} run(s), {} operators, last {:.1?}, mean {:.1?}{}",
            self.invocations,
            self.operators.len(),
            self.last_invoke,
            self.mean_invoke(),
            slowest,
        )
    }
}

fn mean(total: Duration, count: u64) -> Duration {
    match u32::try_from(count) {
        Ok(0) => Duration::ZERO,
        Ok(n) => total / n,
        Err(_) => Duration::from_secs_f64(total.as_secs_f64() / count as f64),
    }
}
