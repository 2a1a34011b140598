use std::{str::FromStr, sync::LazyLock};

use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};

static DOLLAR_FIGURE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\$\s?(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)")
		.expect("Dollar figure regex must compile.")
});

/// Rounds to cents, half away from zero. Only applied when a value is presented.
pub fn round_currency(value: Decimal) -> Decimal {
	let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

	rounded.rescale(2);

	rounded
}

/// `$142.56`, `-$3.10`.
pub fn format_currency(value: Decimal) -> String {
	let rounded = round_currency(value);

	if rounded.is_sign_negative() && !rounded.is_zero() {
		format!("-${}", rounded.abs())
	} else {
		format!("${}", rounded.abs())
	}
}

/// Parses `12`, `12.50`, `$1,204.99`.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
	let cleaned: String =
		raw.trim().trim_start_matches('$').chars().filter(|ch| *ch != ',').collect();

	if cleaned.is_empty() {
		return None;
	}

	Decimal::from_str(cleaned.trim()).ok()
}

/// Every `$`-prefixed figure in free text, in order of appearance.
pub fn dollar_figures(text: &str) -> Vec<Decimal> {
	DOLLAR_FIGURE
		.captures_iter(text)
		.filter_map(|caps| caps.get(1).and_then(|m| parse_amount(m.as_str())))
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rounds_half_up_at_presentation() {
		assert_eq!(round_currency(Decimal::new(10_005, 3)).to_string(), "10.01");
		assert_eq!(round_currency(Decimal::new(10_004, 3)).to_string(), "10.00");
		assert_eq!(round_currency(Decimal::new(7, 0)).to_string(), "7.00");
	}

	#[test]
	fn decimal_sums_do_not_drift() {
		let total = (0..10).fold(Decimal::ZERO, |acc, _| acc + Decimal::new(10, 2));

		assert_eq!(total, Decimal::ONE);
		assert_eq!(format_currency(total), "$1.00");
	}

	#[test]
	fn formats_negative_amounts() {
		assert_eq!(format_currency(Decimal::new(-310, 2)), "-$3.10");
	}

	#[test]
	fn parses_currency_strings() {
		assert_eq!(parse_amount("$1,204.99"), Some(Decimal::new(120_499, 2)));
		assert_eq!(parse_amount("5"), Some(Decimal::new(5, 0)));
		assert_eq!(parse_amount("$"), None);
		assert_eq!(parse_amount("abc"), None);
	}

	#[test]
	fn finds_dollar_figures_in_text() {
		let figures = dollar_figures("You spent $142.56 across 1 receipt, about $1,000 less.");

		assert_eq!(figures, vec![Decimal::new(14_256, 2), Decimal::new(1_000, 0)]);
	}
}
