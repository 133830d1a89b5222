use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

pub const TREND_LABEL: &str = "vs periodo anterior";

/// Period-over-period change. `value` is always a non-negative percentage; the direction
/// lives in `is_positive`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trend {
    pub value: Decimal,
    #[serde(rename = "isPositive")]
    pub is_positive: bool,
    pub label: &'static str,
}

impl Trend {
    /// Compares `current` against `previous`.
    ///
    /// Without a baseline (absent or zero) the change is 100 when `current` is positive and 0
    /// otherwise, and it is never reported as negative. With a negative baseline the magnitude
    /// is taken against its absolute value.
    pub fn between(current: Decimal, previous: Option<Decimal>) -> Self {
        let previous = previous.unwrap_or(Decimal::ZERO);
        if previous.is_zero() {
            let value = if current > Decimal::ZERO {
                Decimal::ONE_HUNDRED
            } else {
                Decimal::ZERO
            };
            return Self::new(value, true);
        }

        let diff = current - previous;
        let percent = diff.abs() / previous.abs() * Decimal::ONE_HUNDRED;
        Self::new(
            percent.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero),
            diff >= Decimal::ZERO,
        )
    }

    /// Shorthand for comparing record counts.
    pub fn between_counts(current: usize, previous: Option<usize>) -> Self {
        Self::between(Decimal::from(current), previous.map(Decimal::from))
    }

    /// The change as a signed percentage, as shown in the variation fields.
    pub fn signed(&self) -> Decimal {
        if self.is_positive {
            self.value
        } else {
            -self.value
        }
    }

    fn new(value: Decimal, is_positive: bool) -> Self {
        Self {
            value,
            is_positive,
            label: TREND_LABEL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_no_baseline_is_hundred_or_zero_and_never_negative() {
        assert_eq!(Trend::between(dec!(50), Some(dec!(0))).value, dec!(100));
        assert!(Trend::between(dec!(50), None).is_positive);
        let flat = Trend::between(dec!(0), Some(dec!(0)));
        assert_eq!(flat.value, dec!(0));
        assert!(flat.is_positive);
        let negative = Trend::between(dec!(-20), None);
        assert_eq!(negative.value, dec!(0));
        assert!(negative.is_positive);
    }

    #[test]
    fn test_percent_change_is_absolute_and_rounded_to_one_decimal() {
        let down = Trend::between(dec!(50), Some(dec!(150)));
        assert_eq!(down.value, dec!(66.7));
        assert!(!down.is_positive);
        assert_eq!(down.signed(), dec!(-66.7));

        let up = Trend::between(dec!(200), Some(dec!(150)));
        assert_eq!(up.value, dec!(33.3));
        assert!(up.is_positive);

        let same = Trend::between(dec!(10), Some(dec!(10)));
        assert_eq!(same.value, dec!(0));
        assert!(same.is_positive);
    }

    #[test]
    fn test_midpoints_round_away_from_zero() {
        // 1/8 = 12.5 %, 1/16 = 6.25 %
        assert_eq!(Trend::between(dec!(9), Some(dec!(8))).value, dec!(12.5));
        assert_eq!(Trend::between(dec!(17), Some(dec!(16))).value, dec!(6.3));
    }

    #[test]
    fn test_negative_baseline_uses_its_magnitude() {
        let trend = Trend::between(dec!(50), Some(dec!(-100)));
        assert_eq!(trend.value, dec!(150));
        assert!(trend.is_positive);
    }

    #[test]
    fn test_count_trend_and_wire_format() {
        let trend = Trend::between_counts(3, Some(4));
        assert_eq!(trend.value, dec!(25));
        let json = serde_json::to_value(&trend).unwrap();
        assert_eq!(json["isPositive"], false);
        assert_eq!(json["label"], "vs periodo anterior");
        assert_eq!(json["value"].as_f64(), Some(25.0));
    }
}
