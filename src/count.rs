//! Clamping of backend-reported counts to the reportable range.

/// Largest monitor count that can be reported.
pub const MAX_SCREEN_COUNT: u8 = u8::MAX;

/// Clamp a raw backend count into `0..=max`.
///
/// Returns the clamped count and whether the raw value overflowed. Negative
/// counts are backend errors rather than topologies and clamp to zero without
/// signalling overflow. Callers log a warning when the flag is set.
pub fn clamp_count(raw: i64, max: u8) -> (u8, bool) {
    if raw > i64::from(max) {
        (max, true)
    } else if raw <= 0 {
        (0, false)
    } else {
        (raw as u8, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_matches_reference_for_all_counts() {
        for raw in -1_000i64..=1_000 {
            let expected = if raw > 255 {
                (255, true)
            } else {
                (raw.max(0) as u8, false)
            };
            assert_eq!(clamp_count(raw, MAX_SCREEN_COUNT), expected, "raw = {raw}");
        }
    }

    #[test]
    fn test_clamp_extremes() {
        assert_eq!(clamp_count(i64::MAX, MAX_SCREEN_COUNT), (255, true));
        assert_eq!(clamp_count(i64::MIN, MAX_SCREEN_COUNT), (0, false));
        assert_eq!(clamp_count(0, MAX_SCREEN_COUNT), (0, false));
    }

    #[test]
    fn test_clamp_small_max() {
        assert_eq!(clamp_count(3, 2), (2, true));
        assert_eq!(clamp_count(2, 2), (2, false));
    }
}
