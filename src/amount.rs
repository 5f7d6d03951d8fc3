use crate::error::AmountError;
use alloy_primitives::U256;
use alloy_primitives::utils::{format_units, parse_units};
use serde::Serialize;
use std::fmt;

/// Fixed-point scale of a [`Percentage`]: one percent is `10^18`.
const PERCENT_DECIMALS: u8 = 18;

pub const PRESET_PERCENTAGES: [u64; 4] = [25, 50, 75, 100];

/// A token quantity in the token's smallest unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TokenAmount(U256);

impl TokenAmount {
    pub const ZERO: TokenAmount = TokenAmount(U256::ZERO);
    pub const MAX: TokenAmount = TokenAmount(U256::MAX);

    pub const fn from_raw(raw: U256) -> Self {
        TokenAmount(raw)
    }

    pub const fn raw(self) -> U256 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Scale user decimal input by `decimals`.
    ///
    /// Negative input and blank input yield zero so callers can decide whether
    /// to submit; malformed text and excess precision are errors.
    pub fn from_decimal(input: &str, decimals: u8) -> Result<Self, AmountError> {
        let trimmed = input.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        if digits.is_empty() && !negative {
            return Ok(TokenAmount::ZERO);
        }

        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        let well_formed = !(whole.is_empty() && fraction.is_empty())
            && whole.bytes().all(|b| b.is_ascii_digit())
            && fraction.bytes().all(|b| b.is_ascii_digit());
        if !well_formed {
            return Err(AmountError::Malformed(input.to_string()));
        }
        if negative {
            return Ok(TokenAmount::ZERO);
        }

        let fraction = fraction.trim_end_matches('0');
        if fraction.len() > decimals as usize {
            return Err(AmountError::TooPrecise {
                input: input.to_string(),
                decimals,
            });
        }

        let whole = if whole.is_empty() { "0" } else { whole };
        let normalized = if fraction.is_empty() {
            whole.to_string()
        } else {
            format!("{whole}.{fraction}")
        };
        parse_units(&normalized, decimals)
            .map(|units| TokenAmount(units.get_absolute()))
            .map_err(|_| AmountError::Malformed(input.to_string()))
    }

    /// Full-precision decimal rendering, e.g. `9.900000` for 6 decimals.
    pub fn format(self, decimals: u8) -> String {
        format_units(self.0, decimals).unwrap_or_else(|_| self.0.to_string())
    }

    /// Two-decimal rendering used on balance displays, rounded half up.
    pub fn format_display(self, decimals: u8) -> String {
        let unit = U256::from(10u64).pow(U256::from(decimals));
        let hundredths = self
            .0
            .saturating_mul(U256::from(100u64))
            .saturating_add(unit / U256::from(2u64))
            / unit;
        let whole = hundredths / U256::from(100u64);
        let cents = (hundredths % U256::from(100u64)).to::<u64>();
        format!("{whole}.{cents:02}")
    }
}

impl From<U256> for TokenAmount {
    fn from(raw: U256) -> Self {
        TokenAmount(raw)
    }
}

impl From<u64> for TokenAmount {
    fn from(raw: u64) -> Self {
        TokenAmount(U256::from(raw))
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A share of a balance, kept as the exact fraction `numerator / denominator`.
///
/// A percentage derived from an amount keeps that amount and its balance, so
/// applying it back to the same balance yields the amount unchanged.
#[derive(Debug, Clone, Copy)]
pub struct Percentage {
    numerator: U256,
    denominator: U256,
}

impl Percentage {
    pub const ZERO: Percentage = Percentage {
        numerator: U256::ZERO,
        denominator: U256::from_limbs([1, 0, 0, 0]),
    };

    pub fn from_whole(percent: u64) -> Self {
        Percentage {
            numerator: U256::from(percent),
            denominator: U256::from(100u64),
        }
    }

    /// Parse a percent figure such as `12.5`, with up to 18 fractional digits.
    pub fn from_decimal(input: &str) -> Result<Self, AmountError> {
        let scaled = TokenAmount::from_decimal(input, PERCENT_DECIMALS)?;
        Ok(Percentage {
            numerator: scaled.raw(),
            denominator: U256::from(100u64) * percent_unit(),
        })
    }

    /// `amount / balance * 100`; zero when the balance is zero.
    pub fn of(amount: TokenAmount, balance: TokenAmount) -> Self {
        if balance.is_zero() {
            return Percentage::ZERO;
        }
        Percentage {
            numerator: amount.raw(),
            denominator: balance.raw(),
        }
    }

    /// `balance * percentage / 100`, rounded down to the token's smallest unit.
    pub fn apply_to(self, balance: TokenAmount) -> TokenAmount {
        if self.numerator == self.denominator {
            return balance;
        }
        TokenAmount(mul_div(balance.raw(), self.numerator, self.denominator))
    }

    /// The percent figure in 18-decimal fixed point.
    fn fixed_point(self) -> U256 {
        mul_div(
            self.numerator,
            U256::from(100u64) * percent_unit(),
            self.denominator,
        )
    }

    pub fn format(self) -> String {
        TokenAmount(self.fixed_point()).format_display(PERCENT_DECIMALS)
    }
}

impl Default for Percentage {
    fn default() -> Self {
        Percentage::ZERO
    }
}

impl PartialEq for Percentage {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for Percentage {}

impl PartialOrd for Percentage {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Percentage {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (
            self.numerator.checked_mul(other.denominator),
            other.numerator.checked_mul(self.denominator),
        ) {
            (Some(left), Some(right)) => left.cmp(&right),
            _ => self.fixed_point().cmp(&other.fixed_point()),
        }
    }
}

impl Serialize for Percentage {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.fixed_point().to_string())
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.format())
    }
}

fn percent_unit() -> U256 {
    U256::from(10u64).pow(U256::from(PERCENT_DECIMALS))
}

/// `value * numerator / denominator`, rounded down.
///
/// Falls back to dividing first when the product does not fit in 256 bits.
fn mul_div(value: U256, numerator: U256, denominator: U256) -> U256 {
    if denominator.is_zero() {
        return U256::ZERO;
    }
    match value.checked_mul(numerator) {
        Some(product) => product / denominator,
        None => (value / denominator)
            .saturating_mul(numerator)
            .saturating_add((value % denominator).saturating_mul(numerator) / denominator),
    }
}

/// Amount/percentage pair behind a deposit or withdraw form.
///
/// Editing either side re-derives the other from the current balance.
#[derive(Debug, Clone)]
pub struct AmountForm {
    decimals: u8,
    balance: TokenAmount,
    amount: TokenAmount,
    percentage: Percentage,
}

impl AmountForm {
    pub fn new(balance: TokenAmount, decimals: u8) -> Self {
        AmountForm {
            decimals,
            balance,
            amount: TokenAmount::ZERO,
            percentage: Percentage::ZERO,
        }
    }

    pub fn set_balance(&mut self, balance: TokenAmount) {
        self.balance = balance;
        self.percentage = Percentage::of(self.amount, balance);
    }

    pub fn enter_amount(&mut self, input: &str) -> Result<(), AmountError> {
        self.amount = TokenAmount::from_decimal(input, self.decimals)?;
        self.percentage = Percentage::of(self.amount, self.balance);
        Ok(())
    }

    pub fn select_percentage(&mut self, percentage: Percentage) {
        self.percentage = percentage;
        self.amount = percentage.apply_to(self.balance);
    }

    pub fn amount(&self) -> TokenAmount {
        self.amount
    }

    pub fn percentage(&self) -> Percentage {
        self.percentage
    }

    pub fn balance(&self) -> TokenAmount {
        self.balance
    }

    /// The amount to hand to an orchestrator, if it is worth submitting.
    pub fn submittable(&self) -> Option<TokenAmount> {
        (!self.amount.is_zero()).then_some(self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(value: u64) -> TokenAmount {
        TokenAmount::from(value)
    }

    #[test]
    fn test_from_decimal_scales_by_decimals() {
        assert_eq!(TokenAmount::from_decimal("50", 6).unwrap(), units(50_000_000));
        assert_eq!(TokenAmount::from_decimal("9.9", 6).unwrap(), units(9_900_000));
        assert_eq!(TokenAmount::from_decimal(".5", 6).unwrap(), units(500_000));
        assert_eq!(TokenAmount::from_decimal(" 1.000000 ", 6).unwrap(), units(1_000_000));
        assert_eq!(
            TokenAmount::from_decimal("1", 18).unwrap(),
            TokenAmount::from(U256::from(10u64).pow(U256::from(18u64)))
        );
    }

    #[test]
    fn test_non_positive_input_yields_zero() {
        for input in ["0", "0.0", "-1", "-0.000001", "-250.5", "", "   "] {
            let amount = TokenAmount::from_decimal(input, 6).unwrap();
            assert!(amount.is_zero(), "{input:?} should map to zero");
        }
    }

    #[test]
    fn test_malformed_input() {
        for input in ["abc", "1.2.3", "1e6", ".", "-", "--1", "0x10"] {
            assert!(
                matches!(
                    TokenAmount::from_decimal(input, 6),
                    Err(AmountError::Malformed(_))
                ),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_too_precise_input() {
        assert_eq!(
            TokenAmount::from_decimal("0.0000001", 6),
            Err(AmountError::TooPrecise {
                input: "0.0000001".to_string(),
                decimals: 6
            })
        );
        // Trailing zeros beyond the precision are harmless.
        assert_eq!(TokenAmount::from_decimal("1.50000000", 6).unwrap(), units(1_500_000));
    }

    #[test]
    fn test_format() {
        assert_eq!(units(9_900_000).format(6), "9.900000");
        assert_eq!(units(9_900_000).format_display(6), "9.90");
        assert_eq!(units(8_505_000).format_display(6), "8.51");
        assert_eq!(units(0).format_display(6), "0.00");
        assert_eq!(units(123_456_789_000).format_display(6), "123456.79");
    }

    #[test]
    fn test_percentage_of_balance() {
        let balance = units(200_000_000);
        assert_eq!(Percentage::of(units(50_000_000), balance), Percentage::from_whole(25));
        assert_eq!(Percentage::of(balance, balance), Percentage::from_whole(100));
        assert_eq!(Percentage::of(units(50_000_000), balance).to_string(), "25.00%");
    }

    #[test]
    fn test_percentage_of_zero_balance_is_zero() {
        assert_eq!(Percentage::of(units(1_000), TokenAmount::ZERO), Percentage::ZERO);
        assert_eq!(Percentage::of(TokenAmount::ZERO, TokenAmount::ZERO), Percentage::ZERO);
    }

    #[test]
    fn test_apply_percentage() {
        let balance = units(9_900_000);
        assert_eq!(Percentage::from_whole(50).apply_to(balance), units(4_950_000));
        assert_eq!(Percentage::from_whole(100).apply_to(balance), balance);
        assert_eq!(Percentage::from_whole(0).apply_to(balance), TokenAmount::ZERO);
        assert_eq!(
            Percentage::from_decimal("12.5").unwrap().apply_to(units(8)),
            units(1)
        );
    }

    fn assert_within_one_unit(a: U256, b: U256) {
        let back = Percentage::of(TokenAmount::from_raw(a), TokenAmount::from_raw(b))
            .apply_to(TokenAmount::from_raw(b))
            .raw();
        let diff = if back > a { back - a } else { a - back };
        assert!(diff <= U256::from(1u64), "a={a} b={b} back={back}");
    }

    #[test]
    fn test_round_trip_within_one_unit() {
        let balances = [1u64, 3, 7, 999_999, 9_900_000, 123_456_789, 10_000_000_000_000];
        let amounts = [0u64, 1, 2, 333_333, 4_950_000, 123_456_789, 99_999_999_999];
        for &b in &balances {
            for &a in &amounts {
                assert_within_one_unit(U256::from(a), U256::from(b));
            }
        }
    }

    #[test]
    fn test_round_trip_large_18_decimal_balances() {
        let million = TokenAmount::from_decimal("1000000", 18).unwrap().raw();
        let one = U256::from(1u64);
        let balances = [
            million,
            million * U256::from(1_000u64) + one,
            TokenAmount::from_decimal("123456789.123456789123456789", 18)
                .unwrap()
                .raw(),
        ];
        for b in balances {
            for a in [one, b / U256::from(3u64), b - one, b] {
                assert_within_one_unit(a, b);
            }
        }

        let pct = Percentage::of(TokenAmount::from_raw(million - one), TokenAmount::from_raw(million));
        assert_eq!(
            pct.apply_to(TokenAmount::from_raw(million)),
            TokenAmount::from_raw(million - one)
        );
        assert_eq!(pct.to_string(), "100.00%");
    }

    #[test]
    fn test_percentage_ordering_across_representations() {
        assert_eq!(Percentage::from_decimal("25").unwrap(), Percentage::from_whole(25));
        assert!(Percentage::from_decimal("12.5").unwrap() < Percentage::from_whole(25));
        assert!(Percentage::of(units(3), units(4)) > Percentage::from_whole(50));
        assert_eq!(Percentage::default(), Percentage::ZERO);
    }

    #[test]
    fn test_form_keeps_sides_consistent() {
        let mut form = AmountForm::new(units(8_500_000), 6);
        assert_eq!(form.submittable(), None);

        form.select_percentage(Percentage::from_whole(PRESET_PERCENTAGES[1]));
        assert_eq!(form.amount(), units(4_250_000));
        assert_eq!(form.submittable(), Some(units(4_250_000)));

        form.enter_amount("2.125").unwrap();
        assert_eq!(form.percentage(), Percentage::from_whole(25));

        form.set_balance(TokenAmount::ZERO);
        assert_eq!(form.percentage(), Percentage::ZERO);
        assert_eq!(form.amount(), units(2_125_000));
    }

    #[test]
    fn test_form_negative_entry_not_submittable() {
        let mut form = AmountForm::new(units(1_000_000), 6);
        form.enter_amount("-5").unwrap();
        assert_eq!(form.amount(), TokenAmount::ZERO);
        assert_eq!(form.percentage(), Percentage::ZERO);
        assert_eq!(form.submittable(), None);
        assert_eq!(form.balance(), units(1_000_000));
    }
}
