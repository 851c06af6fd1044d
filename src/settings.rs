//! Input settings types and sentinel conventions.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Integer sentinel for a setting no backend could determine.
pub const NOT_DETERMINED: i64 = -1;

/// Multi-click interval reported when no backend answers, in milliseconds.
pub const DEFAULT_MULTI_CLICK_TIME: u32 = 200;

/// Keyboard auto-repeat timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RepeatTiming {
    /// Delay before the first repeat, in milliseconds.
    pub delay: u32,
    /// Repeat rate (platform-specific units).
    pub rate: u32,
}

/// Pointer acceleration parameters, each field [`NOT_DETERMINED`] on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointerAcceleration {
    pub numerator: i64,
    pub denominator: i64,
    pub threshold: i64,
}

impl Default for PointerAcceleration {
    fn default() -> Self {
        Self {
            numerator: NOT_DETERMINED,
            denominator: NOT_DETERMINED,
            threshold: NOT_DETERMINED,
        }
    }
}

/// Where a multi-click interval came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ClickTimeSource {
    /// The toolkit's own multi-click query.
    Toolkit,
    /// The `multiClickTime` user default.
    MultiClickTime,
    /// The `MultiClickTimeout` user default.
    MultiClickTimeout,
    /// No backend answered; [`DEFAULT_MULTI_CLICK_TIME`] was used.
    Default,
}

/// Multi-click interval together with its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MultiClickTime {
    /// Interval in milliseconds.
    pub millis: u32,
    pub source: ClickTimeSource,
}

impl MultiClickTime {
    /// The policy default.
    pub const fn fallback() -> Self {
        Self {
            millis: DEFAULT_MULTI_CLICK_TIME,
            source: ClickTimeSource::Default,
        }
    }

    /// Whether the value was reported by a backend rather than defaulted.
    pub fn is_reported(&self) -> bool {
        self.source != ClickTimeSource::Default
    }
}

/// System input settings (platform-specific units where noted).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SystemSettings {
    /// Keyboard repeat rate (platform-specific units).
    pub keyboard_repeat_rate: Option<u32>,
    /// Keyboard repeat delay in milliseconds.
    pub keyboard_repeat_delay: Option<u32>,
    /// Pointer sensitivity (acceleration numerator).
    pub pointer_sensitivity: Option<u32>,
    /// Pointer acceleration multiplier (acceleration denominator).
    pub pointer_acceleration_multiplier: Option<u32>,
    /// Pointer acceleration threshold in pixels.
    pub pointer_acceleration_threshold: Option<u32>,
    /// Multi-click interval; always available.
    pub multi_click_time: MultiClickTime,
}

/// Convert a sentinel-encoded value into an `Option`.
pub fn determined(value: i64) -> Option<u32> {
    u32::try_from(value).ok()
}

/// Parse a multi-click resource value.
///
/// Only the first four characters after leading whitespace are considered.
/// Accepts an optional sign and decimal, `0x` hexadecimal or leading-zero
/// octal digits, stopping at the first character that does not fit.
/// Negative or digitless values are rejected.
pub fn parse_click_time(raw: &str) -> Option<u32> {
    let field: String = raw.trim_start().chars().take(4).collect();
    let (negative, digits) = match field.as_bytes().first() {
        Some(b'-') => (true, &field[1..]),
        Some(b'+') => (false, &field[1..]),
        _ => (false, field.as_str()),
    };

    let (radix, digits) = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .filter(|hex| hex.starts_with(|c: char| c.is_ascii_hexdigit()))
    {
        (16, hex)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };

    let end = digits
        .find(|c: char| !c.is_digit(radix))
        .unwrap_or(digits.len());
    let digits = &digits[..end];

    let value = if digits.is_empty() {
        // A lone "0" prefix before a non-octal character is still zero.
        if radix == 8 { 0 } else { return None }
    } else {
        u32::from_str_radix(digits, radix).ok()?
    };

    if negative && value != 0 {
        return None;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_click_time("350"), Some(350));
        assert_eq!(parse_click_time("  200"), Some(200));
        assert_eq!(parse_click_time("+450"), Some(450));
    }

    #[test]
    fn test_parse_reads_at_most_four_characters() {
        assert_eq!(parse_click_time("123456"), Some(1234));
        assert_eq!(parse_click_time("250ms"), Some(250));
    }

    #[test]
    fn test_parse_radix_prefixes() {
        assert_eq!(parse_click_time("0x1ff"), Some(0x1f));
        assert_eq!(parse_click_time("0x12"), Some(0x12));
        assert_eq!(parse_click_time("017"), Some(0o17));
        assert_eq!(parse_click_time("09"), Some(0));
        assert_eq!(parse_click_time("0"), Some(0));
        assert_eq!(parse_click_time("0x"), Some(0));
    }

    #[test]
    fn test_parse_rejects_garbage_and_negatives() {
        assert_eq!(parse_click_time(""), None);
        assert_eq!(parse_click_time("fast"), None);
        assert_eq!(parse_click_time("-200"), None);
    }

    #[test]
    fn test_determined() {
        assert_eq!(determined(NOT_DETERMINED), None);
        assert_eq!(determined(0), Some(0));
        assert_eq!(determined(660), Some(660));
    }

    #[test]
    fn test_fallback_is_distinguishable() {
        let fallback = MultiClickTime::fallback();
        let reported = MultiClickTime {
            millis: DEFAULT_MULTI_CLICK_TIME,
            source: ClickTimeSource::MultiClickTime,
        };
        assert_eq!(fallback.millis, reported.millis);
        assert_ne!(fallback, reported);
        assert!(!fallback.is_reported());
        assert!(reported.is_reported());
    }
}
