//! Colon-separated time code parsing and normalization.
//!
//! Time codes are what the user types into the start/end fields:
//! `"1:30"`, `"0:02:15"`, or a bare `"90"`. Parsing strips spaces,
//! accepts the full-width colon `：`, and normalizes overflowing
//! fields with carry propagation so `"0:65"` becomes `"1:5"`.

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

/// Errors that can occur while parsing a time code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeCodeError {
    #[error("empty time string")]
    Empty,

    #[error("time field is not a non-negative integer: {0:?}")]
    InvalidField(String),

    #[error("time value too large: {0:?}")]
    Overflow(String),
}

/// Result type for time code operations.
pub type TimeCodeResult<T> = Result<T, TimeCodeError>;

/// A normalized time code: integer fields, most-significant first.
///
/// After normalization every field except the leftmost is in `0..=59`.
/// The leftmost field is uncapped (hours have no upper bound).
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeCode {
    fields: Vec<u64>,
}

impl TimeCode {
    /// Parse and normalize free-form user text into a time code.
    ///
    /// Spaces are stripped and the full-width colon `：` is treated as
    /// `:` before splitting. Each field must parse as a non-negative
    /// integer. Fields are processed right to left with a carry: an
    /// overflowing field becomes `value % 60` and forwards `value / 60`
    /// to the next more significant field. A final non-zero carry is
    /// prepended as a new most-significant field, itself uncapped.
    pub fn parse(raw: &str) -> TimeCodeResult<Self> {
        let cleaned: String = raw.replace('：', ":").replace(' ', "");
        if cleaned.is_empty() {
            return Err(TimeCodeError::Empty);
        }

        let mut fields = Vec::new();
        let mut carry: u64 = 0;

        for part in cleaned.split(':').rev() {
            let value: u64 = part
                .parse()
                .map_err(|_| TimeCodeError::InvalidField(part.to_string()))?;

            let mut tmp = value
                .checked_add(carry)
                .ok_or_else(|| TimeCodeError::Overflow(part.to_string()))?;
            if tmp > 59 {
                carry = tmp / 60;
                tmp %= 60;
            } else {
                carry = 0;
            }
            fields.push(tmp);
        }

        if carry > 0 {
            fields.push(carry);
        }

        fields.reverse();
        Ok(Self { fields })
    }

    /// The normalized fields, most-significant first.
    pub fn fields(&self) -> &[u64] {
        &self.fields
    }

    /// Compare two time codes by positional weight.
    ///
    /// Each field is weighted by successive powers of ten reading right
    /// to left (`s + m*10 + h*100`), not by 60/3600 as real time units.
    /// This is NOT chronological order when field widths differ:
    /// `"0:59"` compares greater than `"1:00"`. The rule is kept
    /// deliberately and pinned by tests; it is exposed as a named
    /// method rather than `Ord` because distinct field vectors (e.g.
    /// `"10"` and `"1:0"`) can compare equal.
    pub fn positional_cmp(&self, other: &TimeCode) -> Ordering {
        self.positional_value().cmp(&other.positional_value())
    }

    /// The positional weight used by [`TimeCode::positional_cmp`].
    ///
    /// Saturating arithmetic: codes wide or large enough to exceed
    /// `u128` all compare as the maximum weight instead of panicking.
    fn positional_value(&self) -> u128 {
        let mut value: u128 = 0;
        let mut base: u128 = 1;
        for field in self.fields.iter().rev() {
            value = value.saturating_add(u128::from(*field).saturating_mul(base));
            base = base.saturating_mul(10);
        }
        value
    }
}

impl fmt::Display for TimeCode {
    /// Fields joined with `:`, no zero padding (`[1, 5]` renders `1:5`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for field in &self.fields {
            if !first {
                write!(f, ":")?;
            }
            write!(f, "{}", field)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_fields() {
        let tc = TimeCode::parse("1:5").unwrap();
        assert_eq!(tc.fields(), &[1, 5]);
        assert_eq!(tc.to_string(), "1:5");
    }

    #[test]
    fn carry_propagates_to_next_field() {
        let tc = TimeCode::parse("0:65").unwrap();
        assert_eq!(tc.fields(), &[1, 5]);
        assert_eq!(tc.to_string(), "1:5");
    }

    #[test]
    fn final_carry_prepends_field() {
        let tc = TimeCode::parse("75").unwrap();
        assert_eq!(tc.to_string(), "1:15");

        // 7200 seconds: prepended carry stays uncapped.
        let tc = TimeCode::parse("0:7200").unwrap();
        assert_eq!(tc.fields(), &[120, 0, 0]);
    }

    #[test]
    fn strips_spaces_and_fullwidth_colon() {
        let tc = TimeCode::parse(" 1：30 ").unwrap();
        assert_eq!(tc.to_string(), "1:30");
    }

    #[test]
    fn rejects_empty_and_non_numeric() {
        assert_eq!(TimeCode::parse(""), Err(TimeCodeError::Empty));
        assert_eq!(TimeCode::parse("   "), Err(TimeCodeError::Empty));
        assert!(matches!(
            TimeCode::parse("abc"),
            Err(TimeCodeError::InvalidField(_))
        ));
        assert!(matches!(
            TimeCode::parse("1:-5"),
            Err(TimeCodeError::InvalidField(_))
        ));
        assert!(matches!(
            TimeCode::parse("1::5"),
            Err(TimeCodeError::InvalidField(_))
        ));
    }

    #[test]
    fn extreme_magnitude_fields_are_rejected_not_wrapped() {
        // A lone maximum field still normalizes via carry.
        let tc = TimeCode::parse(&u64::MAX.to_string()).unwrap();
        assert_eq!(tc.fields(), &[u64::MAX / 60, u64::MAX % 60]);

        // Adjacent maximum fields would overflow the carry addition.
        let raw = format!("{}:{}", u64::MAX, u64::MAX);
        assert!(matches!(
            TimeCode::parse(&raw),
            Err(TimeCodeError::Overflow(_))
        ));
    }

    #[test]
    fn very_wide_codes_compare_without_panicking() {
        // 45 fields outgrow 10^45 weights; comparison saturates.
        let zeros = TimeCode::parse(&vec!["0"; 45].join(":")).unwrap();
        assert_eq!(zeros.positional_cmp(&zeros), Ordering::Equal);

        let fifty_nines = TimeCode::parse(&vec!["59"; 45].join(":")).unwrap();
        assert_eq!(zeros.positional_cmp(&fifty_nines), Ordering::Less);
        assert_eq!(fifty_nines.positional_cmp(&zeros), Ordering::Greater);
    }

    #[test]
    fn positional_cmp_is_not_chronological() {
        let a = TimeCode::parse("1:00").unwrap();
        let b = TimeCode::parse("0:59").unwrap();
        // 1:00 weighs 10, 0:59 weighs 59.
        assert_eq!(a.positional_cmp(&b), Ordering::Less);

        let c = TimeCode::parse("10").unwrap();
        let d = TimeCode::parse("1:0").unwrap();
        assert_eq!(c.positional_cmp(&d), Ordering::Equal);
    }

    #[test]
    fn positional_cmp_orders_same_width_codes() {
        let start = TimeCode::parse("0:30").unwrap();
        let end = TimeCode::parse("1:10").unwrap();
        assert_eq!(start.positional_cmp(&end), Ordering::Less);
        assert_eq!(end.positional_cmp(&start), Ordering::Greater);
        assert_eq!(start.positional_cmp(&start), Ordering::Equal);
    }

    #[test]
    fn reparse_of_display_is_identity() {
        for raw in ["0:65", "75", "1:2:3", "59:59"] {
            let tc = TimeCode::parse(raw).unwrap();
            let again = TimeCode::parse(&tc.to_string()).unwrap();
            assert_eq!(tc, again);
        }
    }
}
