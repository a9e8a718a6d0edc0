// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Allocation statistics for profiling and arena sizing.

/// Cumulative statistics about arena usage.
///
/// The high-water mark is the number to size a production arena by: it is
/// the largest `used()` value the arena has ever reached, across resets.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ArenaStats {
    /// Number of successful allocations.
    pub allocations: u64,
    /// Bytes handed out by successful allocations (excluding padding).
    pub bytes_requested: u64,
    /// Bytes skipped to satisfy alignment.
    pub padding_bytes: u64,
    /// Number of allocation requests that failed.
    pub failed_allocations: u64,
    /// Number of times the arena was reset.
    pub resets: u64,
    /// Peak arena usage in bytes.
    pub high_water_mark: usize,
}

impl ArenaStats {
    pub(crate) fn record_allocation(&mut self, size: usize, padding: usize, used_after: usize) {
        self.allocations += 1;
        self.bytes_requested += size as u64;
        self.padding_bytes += padding as u64;
        if used_after > self.high_water_mark {
            self.high_water_mark = used_after;
        }
    }

    pub(crate) fn record_failure(&mut self) {
        self.failed_allocations += 1;
    }

    pub(crate) fn record_reset(&mut self) {
        self.resets += 1;
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "Allocations: {} ok, {} failed, {} B requested, {} B padding, \
             peak {} B, {} resets",
            self.allocations,
            self.failed_allocations,
            self.bytes_requested,
            self.padding_bytes,
            self.high_water_mark,
            self.resets,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let s = ArenaStats::default();
        assert_eq!(s.allocations, 0);
        assert_eq!(s.high_water_mark, 0);
    }

    #[test]
    fn test_peak_tracking() {
        let mut s = ArenaStats::default();
        s.record_allocation(100, 0, 100);
        assert_eq!(s.high_water_mark, 100);
        s.record_reset();
        s.record_allocation(50, 0, 50);
        assert_eq!(s.high_water_mark, 100); // Doesn't decrease.
        s.record_allocation(200, 6, 256);
        assert_eq!(s.high_water_mark, 256);
        assert_eq!(s.padding_bytes, 6);
    }

    #[test]
    fn test_summary() {
        let mut s = ArenaStats::default();
        s.record_allocation(192, 0, 192);
        s.record_failure();
        let summary = s.summary();
        assert!(summary.contains("1 ok"));
        assert!(summary.contains("1 failed"));
        assert!(summary.contains("192 B requested"));
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut s = ArenaStats::default();
        s.record_allocation(64, 0, 64);
        let json = serde_json::to_string(&s).unwrap();
        let back: ArenaStats = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);
    }
}
