//! Shared virtual timeline for looping tape animations
//!
//! Each tape runs the same keyframes with its own fixed phase offset, so a
//! top strip and a bottom strip read as one continuous path. Positions are
//! stored on the shared timeline and mapped back to per-element elapsed time
//! on restore.

/// Reduce `value` into `[0, modulus)`; works for negative and huge inputs
#[inline]
pub fn wrap_ms(value: f64, modulus: f64) -> f64 {
    let wrapped = value.rem_euclid(modulus);
    // rem_euclid can round up to exactly `modulus` for tiny negative inputs
    if wrapped >= modulus { 0.0 } else { wrapped }
}

/// Negative `animation-delay` (seconds) that starts a loop `elapsed_ms` in
#[inline]
pub fn start_delay_secs(elapsed_ms: f64) -> f64 {
    if elapsed_ms == 0.0 { 0.0 } else { -elapsed_ms / 1000.0 }
}

/// Per-element phase offsets against one cycle duration
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseTable {
    cycle_ms: f64,
    offsets_ms: Vec<f64>,
}

impl PhaseTable {
    pub fn new(cycle_ms: f64, offsets_ms: Vec<f64>) -> Self {
        let cycle_ms = if cycle_ms.is_finite() && cycle_ms > 0.0 {
            cycle_ms
        } else {
            crate::consts::DEFAULT_CYCLE_MS
        };
        Self {
            cycle_ms,
            offsets_ms,
        }
    }

    pub fn cycle_ms(&self) -> f64 {
        self.cycle_ms
    }

    /// Number of elements the offset table was written for
    pub fn len(&self) -> usize {
        self.offsets_ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets_ms.is_empty()
    }

    /// Offset of element `index`; elements past the table run unshifted
    pub fn offset(&self, index: usize) -> f64 {
        self.offsets_ms.get(index).copied().unwrap_or(0.0)
    }

    /// True when `tracked` elements line up with the offset table
    pub fn matches(&self, tracked: usize) -> bool {
        tracked == self.offsets_ms.len()
    }

    /// Use `duration` when the live animation reports a usable one
    pub fn effective_duration(&self, duration: Option<f64>) -> f64 {
        match duration {
            Some(d) if d.is_finite() && d > 0.0 => d,
            _ => self.cycle_ms,
        }
    }

    /// Map an element's raw elapsed time onto the shared timeline
    pub fn capture(&self, index: usize, raw_elapsed_ms: f64, duration: Option<f64>) -> f64 {
        let duration = self.effective_duration(duration);
        let raw = if raw_elapsed_ms.is_finite() { raw_elapsed_ms } else { 0.0 };
        wrap_ms(raw + self.offset(index), duration)
    }

    /// Raw elapsed time element `index` needs to sit at `shared_ms`
    pub fn restore(&self, index: usize, shared_ms: f64, duration: Option<f64>) -> f64 {
        let duration = self.effective_duration(duration);
        let shared = if shared_ms.is_finite() { shared_ms } else { 0.0 };
        wrap_ms(shared - self.offset(index), duration)
    }
}

impl Default for PhaseTable {
    fn default() -> Self {
        Self::new(
            crate::consts::DEFAULT_CYCLE_MS,
            crate::consts::DEFAULT_PHASE_OFFSETS_MS.to_vec(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn table() -> PhaseTable {
        PhaseTable::new(30_000.0, vec![0.0, 21_800.0, 15_300.0])
    }

    #[test]
    fn test_capture_without_offset() {
        assert_eq!(table().capture(0, 5_000.0, None), 5_000.0);
    }

    #[test]
    fn test_capture_reduces_large_elapsed() {
        let t = table();
        assert_eq!(t.capture(0, 30_000.0 * 1000.0 + 500.0, None), 500.0);
        assert_eq!(t.capture(0, 30_000.0, None), 0.0);
    }

    #[test]
    fn test_restore_with_offset() {
        let t = table();
        let raw = t.restore(1, 5_000.0, None);
        assert_eq!(raw, 13_200.0);
        assert!((start_delay_secs(raw) - -13.2).abs() < 1e-9);
        // Going back through capture lands on the same shared position
        assert_eq!(t.capture(1, raw, None), 5_000.0);
    }

    #[test]
    fn test_offset_past_table_is_zero() {
        let t = table();
        assert_eq!(t.offset(7), 0.0);
        assert_eq!(t.restore(7, 1_234.0, None), 1_234.0);
        assert!(t.matches(3));
        assert!(!t.matches(4));
    }

    #[test]
    fn test_live_duration_overrides_cycle() {
        let t = table();
        assert_eq!(t.capture(0, 25_000.0, Some(20_000.0)), 5_000.0);
        assert_eq!(t.capture(0, 25_000.0, Some(f64::NAN)), 25_000.0);
        assert_eq!(t.capture(0, 25_000.0, Some(0.0)), 25_000.0);
    }

    #[test]
    fn test_invalid_cycle_falls_back() {
        let t = PhaseTable::new(-1.0, vec![]);
        assert_eq!(t.cycle_ms(), crate::consts::DEFAULT_CYCLE_MS);
    }

    #[test]
    fn test_wrap_tiny_negative() {
        let w = wrap_ms(-1e-20, 30_000.0);
        assert!((0.0..30_000.0).contains(&w));
    }

    #[test]
    fn test_zero_delay_is_not_negative_zero() {
        assert!(start_delay_secs(0.0).is_sign_positive());
    }

    proptest! {
        #[test]
        fn prop_capture_in_range(raw in 0.0f64..1e12, idx in 0usize..5) {
            let shared = table().capture(idx, raw, None);
            prop_assert!((0.0..30_000.0).contains(&shared));
        }

        #[test]
        fn prop_restore_inverts_capture(raw in 0.0f64..30_000.0, idx in 0usize..5) {
            let t = table();
            let back = t.restore(idx, t.capture(idx, raw, None), None);
            // Compare on the circle, tolerate one frame of float drift
            let diff = (back - raw).abs();
            prop_assert!(diff < 1e-6 || (30_000.0 - diff) < 1e-6);
        }
    }
}
