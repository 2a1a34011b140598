//! Date expression resolution.
//!
//! Rules are tried in a fixed order (absolute, month, relative, named period, contextual range)
//! and the first one that recognizes the text wins. Expressions no rule understands but that
//! still carry a temporal cue are reported as [`RuleResolution::Deferred`] so the caller can
//! consult the generative fallback.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use time::{Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, Time, Weekday, macros::time};

use crate::normalize::normalize_query;

const MONTHS: &str = "january|jan|february|feb|march|mar|april|apr|may|june|jun|july|jul|august|aug|september|sept|sep|october|oct|november|nov|december|dec";
const END_OF_DAY: Time = time!(23:59:59.999999);
const YEAR_LOOKBACK: i32 = 8;

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| compile(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b"));
static SLASH_DATE: LazyLock<Regex> =
	LazyLock::new(|| compile(r"\b(\d{1,2})/(\d{1,2})/(\d{4}|\d{2})\b"));
static TEXT_DATE: LazyLock<Regex> = LazyLock::new(|| {
	compile(&format!(
		r"\b({MONTHS})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(\d{{4}})\b)?"
	))
});
static DAY_OF_MONTH: LazyLock<Regex> = LazyLock::new(|| {
	compile(&format!(r"\b(\d{{1,2}})(?:st|nd|rd|th)?\s+of\s+({MONTHS})\b(?:,?\s+(\d{{4}})\b)?"))
});
static MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
	compile(&format!(r"\b({MONTHS})\b\.?(?:,?\s+(?:of\s+)?(\d{{4}})\b)?"))
});
static QUARTER: LazyLock<Regex> = LazyLock::new(|| {
	compile(r"\b(?:q([1-4])|(first|second|third|fourth|1st|2nd|3rd|4th)\s+quarter)\b(?:\s+(?:of\s+)?(\d{4})\b)?")
});
static YEAR: LazyLock<Regex> =
	LazyLock::new(|| compile(r"\b(?:in|during|for|of|throughout)\s+((?:19|20)\d{2})\b"));
static SINCE: LazyLock<Regex> = LazyLock::new(|| compile(r"\bsince\s+(.+)"));
static BETWEEN: LazyLock<Regex> = LazyLock::new(|| compile(r"\bbetween\s+(.+?)\s+and\s+(.+)"));
static FROM_TO: LazyLock<Regex> =
	LazyLock::new(|| compile(r"\bfrom\s+(.+?)\s+(?:to|until|till|through|thru)\s+(.+)"));
static OPEN_MARKER: LazyLock<Regex> =
	LazyLock::new(|| compile(r"\b(?:before|after|prior\s+to|until|till)\s+(?:the\s+|my\s+)?(\S+)"));
static TIME_CUE: LazyLock<Regex> = LazyLock::new(|| {
	compile(&format!(
		r"\b(?:{MONTHS}|today|yesterday|tonight|days?|weeks?|weekend|months?|years?|quarter|q[1-4]|ago|since|recent|recently|lately|season|summer|winter|spring|autumn|holidays?|christmas|xmas|thanksgiving|halloween|easter|valentine'?s|new\s+year'?s|black\s+friday|cyber\s+monday|memorial\s+day|labor\s+day|independence\s+day|fourth\s+of\s+july|monday|tuesday|wednesday|thursday|friday|saturday|sunday|morning|evening|night)\b|\b\d{{1,2}}/\d{{1,2}}\b|\b(?:19|20)\d{{2}}\b"
	))
});
/// Dollar figures, which may look like years ("over $2000").
static AMOUNT_FIGURE: LazyLock<Regex> = LazyLock::new(|| {
	compile(
		r"\$\s?\d[\d,]*(?:\.\d+)?|\b\d[\d,]*(?:\.\d+)?\s*(?:dollars|bucks|usd)\b|\b(?:more|greater|less|cheaper)\s+than\s+\d[\d,]*(?:\.\d+)?|\b(?:at\s+least|at\s+most|up\s+to|over|above|exceeding|under|below)\s+\d[\d,]*(?:\.\d+)?",
	)
});
static RELATIVE_RULES: LazyLock<Vec<(Regex, RelativeRule)>> = LazyLock::new(|| {
	vec![
		relative_rule(r"\btoday\b", |_, today| Some(Hit::Range(DateRange::day(today)))),
		relative_rule(r"\byesterday\b", |_, today| Some(day_hit(today.previous_day()))),
		relative_rule(r"\b(?:last|past|previous)\s+(\d+)\s+(day|week|month)s?\b", last_n_units),
		relative_rule(r"\bthis\s+week\b", |_, today| {
			Some(span_hit(monday_of(today), Some(today)))
		}),
		relative_rule(r"\b(?:last|previous)\s+week\b", |_, today| {
			let monday = monday_of(today).checked_sub(Duration::days(7))?;

			Some(span_hit(monday, monday.checked_add(Duration::days(6))))
		}),
		relative_rule(r"\bpast\s+week\b", |_, today| Some(trailing_days(today, 7))),
		relative_rule(r"\b(?:last|previous|past)\s+weekend\b", |_, today| {
			let monday = monday_of(today);

			Some(span_hit(
				monday.checked_sub(Duration::days(2))?,
				monday.checked_sub(Duration::days(1)),
			))
		}),
		relative_rule(r"\bthis\s+month\b", |_, today| {
			Some(span_hit(today.replace_day(1).ok()?, Some(today)))
		}),
		relative_rule(r"\b(?:last|previous)\s+month\b", |_, today| {
			let first = today.replace_day(1).ok()?.previous_day()?;

			Some(month_hit(first.year(), first.month()))
		}),
		relative_rule(r"\bpast\s+month\b", |_, today| Some(trailing_days(today, 30))),
		relative_rule(r"\bthis\s+year\b", |_, today| {
			let first = Date::from_calendar_date(today.year(), Month::January, 1).ok()?;

			Some(span_hit(first, Some(today)))
		}),
		relative_rule(r"\b(?:last|previous)\s+year\b", |_, today| Some(year_hit(today.year() - 1))),
		relative_rule(r"\bpast\s+year\b", |_, today| Some(trailing_days(today, 365))),
		relative_rule(
			r"\b(?:last|this\s+past|on)\s+(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
			last_weekday,
		),
		relative_rule(r"\b(?:recently|lately|recent)\b", |_, today| Some(trailing_days(today, 30))),
	]
});
static HOLIDAYS: LazyLock<Vec<(Regex, Holiday)>> = LazyLock::new(|| {
	vec![
		holiday(r"\bnew\s+year'?s\s+eve\b", |year| fixed(year, Month::December, 31)),
		holiday(r"\bnew\s+year'?s(?:\s+day)?\b", |year| fixed(year, Month::January, 1)),
		holiday(r"\bvalentine'?s(?:\s+day)?\b", |year| fixed(year, Month::February, 14)),
		holiday(r"\bmemorial\s+day\b", |year| last_weekday_of(year, Month::May, Weekday::Monday)),
		holiday(r"\b(?:fourth\s+of\s+july|independence\s+day)\b", |year| {
			fixed(year, Month::July, 4)
		}),
		holiday(r"\blabor\s+day\b", |year| {
			nth_weekday_of(year, Month::September, Weekday::Monday, 1)
		}),
		holiday(r"\bhalloween\b", |year| fixed(year, Month::October, 31)),
		holiday(r"\bblack\s+friday\b", |year| thanksgiving(year)?.checked_add(Duration::days(1))),
		holiday(r"\bcyber\s+monday\b", |year| thanksgiving(year)?.checked_add(Duration::days(4))),
		holiday(r"\bthanksgiving(?:\s+day)?\b", thanksgiving),
		holiday(r"\b(?:christmas|xmas)\s+eve\b", |year| fixed(year, Month::December, 24)),
		holiday(r"\b(?:christmas|xmas)(?:\s+day)?\b", |year| fixed(year, Month::December, 25)),
	]
});

type RelativeRule = fn(&Captures<'_>, Date) -> Option<Hit>;
type Holiday = fn(i32) -> Option<Date>;
type PointRule = fn(&str, Date) -> Option<Hit>;

/// Inclusive UTC range from the first instant of the first day to the last microsecond of the
/// last day.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DateRange {
	#[serde(with = "crate::time_serde")]
	pub start: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub end: OffsetDateTime,
}
impl DateRange {
	pub fn day(date: Date) -> Self {
		Self::days(date, date)
	}

	pub fn days(first: Date, last: Date) -> Self {
		Self {
			start: first.midnight().assume_utc(),
			end: PrimitiveDateTime::new(last, END_OF_DAY).assume_utc(),
		}
	}

	pub fn contains(&self, ts: OffsetDateTime) -> bool {
		ts >= self.start && ts <= self.end
	}

	pub fn first_day(&self) -> Date {
		self.start.date()
	}

	pub fn last_day(&self) -> Date {
		self.end.date()
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalStrategy {
	Absolute,
	Month,
	Relative,
	NamedPeriod,
	Contextual,
	Fallback,
}

/// Result of the rule chain alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleResolution {
	/// No temporal cue in the text.
	NotMentioned,
	Resolved { range: DateRange, strategy: TemporalStrategy },
	/// A rule recognized the expression but its values are impossible (e.g. February 30).
	Invalid,
	/// The text talks about time but no rule understood it.
	Deferred,
}

/// Temporal axis of an interpreted query.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TemporalOutcome {
	NotMentioned,
	Resolved { range: DateRange, strategy: TemporalStrategy },
	Unresolved,
}
impl TemporalOutcome {
	pub fn range(&self) -> Option<&DateRange> {
		match self {
			Self::Resolved { range, .. } => Some(range),
			_ => None,
		}
	}

	pub fn is_mentioned(&self) -> bool {
		!matches!(self, Self::NotMentioned)
	}

	pub fn is_unresolved(&self) -> bool {
		matches!(self, Self::Unresolved)
	}

	pub fn is_generative(&self) -> bool {
		matches!(self, Self::Resolved { strategy: TemporalStrategy::Fallback, .. })
	}
}

/// Shape-checked reply from the generative fallback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FallbackReply {
	NoDate,
	Range(DateRange),
	Rejected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Hit {
	Range(DateRange),
	Invalid,
}

pub fn resolve(text: &str, today: Date) -> RuleResolution {
	let text = normalize_query(text);

	if text.is_empty() {
		return RuleResolution::NotMentioned;
	}

	let ranged = has_range_marker(&text, today);
	let rules: [(TemporalStrategy, PointRule); 5] = [
		(TemporalStrategy::Absolute, absolute),
		(TemporalStrategy::Month, month_name),
		(TemporalStrategy::Relative, relative),
		(TemporalStrategy::NamedPeriod, named_period),
		(TemporalStrategy::Contextual, contextual),
	];

	for (strategy, rule) in rules {
		if ranged && strategy != TemporalStrategy::Contextual {
			continue;
		}

		match rule(&text, today) {
			Some(Hit::Range(range)) => return RuleResolution::Resolved { range, strategy },
			Some(Hit::Invalid) => return RuleResolution::Invalid,
			None => {},
		}
	}

	if mentions_time(&text) { RuleResolution::Deferred } else { RuleResolution::NotMentioned }
}

/// Whether the text carries any word or figure that talks about time. Dollar figures never
/// count as years.
pub fn mentions_time(text: &str) -> bool {
	let text = normalize_query(text);

	TIME_CUE.is_match(&AMOUNT_FIGURE.replace_all(&text, " "))
}

/// Accepts `{"start": "YYYY-MM-DD", "end": "YYYY-MM-DD"}`, the same object nested under
/// `date_range`, or `null`. Surrounding prose and code fences are ignored.
pub fn parse_fallback_reply(reply: &str) -> FallbackReply {
	let trimmed = reply.trim();
	let body = match (trimmed.find('{'), trimmed.rfind('}')) {
		(Some(open), Some(close)) if open < close => &trimmed[open..=close],
		_ =>
			return if trimmed.trim_matches('`').trim().eq_ignore_ascii_case("null") {
				FallbackReply::NoDate
			} else {
				FallbackReply::Rejected
			},
	};
	let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
		return FallbackReply::Rejected;
	};
	let value = match value.get("date_range") {
		Some(inner) => inner.clone(),
		None => value,
	};

	if value.is_null() {
		return FallbackReply::NoDate;
	}

	let (Some(start), Some(end)) = (
		value.get("start").and_then(|raw| raw.as_str()).and_then(parse_iso_day),
		value.get("end").and_then(|raw| raw.as_str()).and_then(parse_iso_day),
	) else {
		return FallbackReply::Rejected;
	};

	if start > end {
		return FallbackReply::Rejected;
	}

	FallbackReply::Range(DateRange::days(start, end))
}

fn compile(pattern: &str) -> Regex {
	Regex::new(pattern).expect("Temporal regex must compile.")
}

fn relative_rule(pattern: &str, rule: RelativeRule) -> (Regex, RelativeRule) {
	(compile(pattern), rule)
}

fn holiday(pattern: &str, date: Holiday) -> (Regex, Holiday) {
	(compile(pattern), date)
}

fn parse_iso_day(raw: &str) -> Option<Date> {
	let caps = ISO_DATE.captures(raw.trim())?;

	calendar_date(number(&caps, 1)?, number(&caps, 2)?, number(&caps, 3)?)
}

fn has_range_marker(text: &str, today: Date) -> bool {
	if SINCE.is_match(text) || endpoints(text, today).is_some() {
		return true;
	}

	OPEN_MARKER.captures_iter(text).any(|caps| {
		caps.get(1).is_some_and(|next| {
			let next = next.as_str();

			next.starts_with(|ch: char| ch.is_ascii_digit()) || mentions_time(next)
		})
	})
}

fn resolve_point(fragment: &str, today: Date) -> Option<Hit> {
	let rules: [PointRule; 4] = [absolute, month_name, relative, named_period];

	rules.into_iter().find_map(|rule| rule(fragment, today))
}

fn absolute(text: &str, today: Date) -> Option<Hit> {
	if let Some(caps) = ISO_DATE.captures(text) {
		return Some(day_hit(calendar_date(
			number(&caps, 1)?,
			number(&caps, 2)?,
			number(&caps, 3)?,
		)));
	}
	if let Some(caps) = SLASH_DATE.captures(text) {
		let raw_year = caps.get(3)?.as_str();
		let year = number(&caps, 3)?;
		let year = if raw_year.len() == 2 { 2_000 + year } else { year };

		return Some(day_hit(calendar_date(year, number(&caps, 1)?, number(&caps, 2)?)));
	}
	if let Some(caps) = TEXT_DATE.captures(text) {
		return Some(month_day_hit(&caps, 1, 2, 3, today));
	}
	if let Some(caps) = DAY_OF_MONTH.captures(text) {
		return Some(month_day_hit(&caps, 2, 1, 3, today));
	}

	None
}

fn month_name(text: &str, today: Date) -> Option<Hit> {
	let caps = MONTH_YEAR.captures(text)?;
	let month = month_from_name(caps.get(1)?.as_str())?;
	let year = match number(&caps, 2) {
		Some(year) => year,
		None if u8::from(month) <= u8::from(today.month()) => today.year(),
		None => today.year() - 1,
	};

	Some(month_hit(year, month))
}

fn relative(text: &str, today: Date) -> Option<Hit> {
	RELATIVE_RULES
		.iter()
		.find_map(|(pattern, rule)| pattern.captures(text).and_then(|caps| rule(&caps, today)))
}

fn named_period(text: &str, today: Date) -> Option<Hit> {
	if let Some(caps) = QUARTER.captures(text) {
		let quarter = match (caps.get(1), caps.get(2)) {
			(Some(digit), _) => digit.as_str().parse::<u8>().ok()?,
			(None, Some(ordinal)) => match ordinal.as_str() {
				"first" | "1st" => 1,
				"second" | "2nd" => 2,
				"third" | "3rd" => 3,
				_ => 4,
			},
			(None, None) => return None,
		};
		let first_month = (quarter - 1) * 3 + 1;
		let year = match number(&caps, 3) {
			Some(year) => year,
			None if first_month <= u8::from(today.month()) => today.year(),
			None => today.year() - 1,
		};
		let start = calendar_date(year, i32::from(first_month), 1);
		let end = Month::try_from(first_month + 2).ok().and_then(|last| month_end(year, last));

		return Some(match start {
			Some(start) => span_hit(start, end),
			None => Hit::Invalid,
		});
	}

	for (pattern, holiday_date) in HOLIDAYS.iter() {
		let Some(found) = pattern.find(text) else {
			continue;
		};
		let before = text[..found.start()].trim_end();
		let after = text[found.end()..].trim_start();
		let after_week = after.strip_prefix("week").map(str::trim_start);
		let weekly = before.ends_with("week of") || before.ends_with("week of the");
		let weekly = weekly || after_week.is_some();
		let explicit_year = after_week
			.unwrap_or(after)
			.trim_start_matches(',')
			.trim_start()
			.split(|ch: char| !ch.is_ascii_digit())
			.next()
			.filter(|digits| digits.len() == 4)
			.and_then(|digits| digits.parse::<i32>().ok());
		let date = match explicit_year {
			Some(year) => holiday_date(year),
			None => holiday_date(today.year())
				.filter(|date| *date <= today)
				.or_else(|| holiday_date(today.year() - 1)),
		};
		let Some(date) = date else {
			return Some(Hit::Invalid);
		};

		if weekly {
			let monday = monday_of(date);

			return Some(span_hit(monday, monday.checked_add(Duration::days(6))));
		}

		return Some(Hit::Range(DateRange::day(date)));
	}

	let caps = YEAR.captures(text)?;

	Some(year_hit(number(&caps, 1)?))
}

fn contextual(text: &str, today: Date) -> Option<Hit> {
	if let Some(caps) = SINCE.captures(text) {
		return match resolve_point(caps.get(1)?.as_str(), today)? {
			Hit::Range(range) if range.first_day() <= today =>
				Some(Hit::Range(DateRange { start: range.start, end: DateRange::day(today).end })),
			_ => Some(Hit::Invalid),
		};
	}

	let (first, last) = endpoints(text, today)?;

	match (first, last) {
		(Hit::Range(first), Hit::Range(last)) if first.start <= last.end =>
			Some(Hit::Range(DateRange { start: first.start, end: last.end })),
		_ => Some(Hit::Invalid),
	}
}

/// Both endpoints of `between X and Y` or `from X to Y`, when each one is a date expression.
fn endpoints(text: &str, today: Date) -> Option<(Hit, Hit)> {
	[&BETWEEN, &FROM_TO].into_iter().find_map(|pattern| {
		let caps = pattern.captures(text)?;
		let first = resolve_point(caps.get(1)?.as_str(), today)?;
		let last = resolve_point(caps.get(2)?.as_str(), today)?;

		Some((first, last))
	})
}

fn last_n_units(caps: &Captures<'_>, today: Date) -> Option<Hit> {
	let count = number(caps, 1)?;

	if count <= 0 {
		return Some(Hit::Invalid);
	}

	match caps.get(2)?.as_str() {
		"day" => Some(trailing_days(today, count)),
		"week" => Some(trailing_days(today, count.checked_mul(7)?)),
		_ => {
			let start = shift_months(today, count)?.next_day()?;

			Some(span_hit(start, Some(today)))
		},
	}
}

fn last_weekday(caps: &Captures<'_>, today: Date) -> Option<Hit> {
	let target = match caps.get(1)?.as_str() {
		"monday" => Weekday::Monday,
		"tuesday" => Weekday::Tuesday,
		"wednesday" => Weekday::Wednesday,
		"thursday" => Weekday::Thursday,
		"friday" => Weekday::Friday,
		"saturday" => Weekday::Saturday,
		_ => Weekday::Sunday,
	};
	let mut date = today.previous_day()?;

	while date.weekday() != target {
		date = date.previous_day()?;
	}

	Some(Hit::Range(DateRange::day(date)))
}

/// The `days` calendar days ending today.
fn trailing_days(today: Date, days: i32) -> Hit {
	span_hit(
		today.checked_sub(Duration::days(i64::from(days) - 1)).unwrap_or(Date::MIN),
		Some(today),
	)
}

fn month_day_hit(
	caps: &Captures<'_>,
	month_idx: usize,
	day_idx: usize,
	year_idx: usize,
	today: Date,
) -> Hit {
	let Some(month) = caps.get(month_idx).and_then(|m| month_from_name(m.as_str())) else {
		return Hit::Invalid;
	};
	let Some(day) = number(caps, day_idx).and_then(|day| u8::try_from(day).ok()) else {
		return Hit::Invalid;
	};
	let date = match number(caps, year_idx) {
		Some(year) => Date::from_calendar_date(year, month, day).ok(),
		None => (0..YEAR_LOOKBACK)
			.filter_map(|back| Date::from_calendar_date(today.year() - back, month, day).ok())
			.find(|date| *date <= today),
	};

	day_hit(date)
}

fn day_hit(date: Option<Date>) -> Hit {
	date.map_or(Hit::Invalid, |date| Hit::Range(DateRange::day(date)))
}

fn span_hit(first: Date, last: Option<Date>) -> Hit {
	match last {
		Some(last) if first <= last => Hit::Range(DateRange::days(first, last)),
		_ => Hit::Invalid,
	}
}

fn month_hit(year: i32, month: Month) -> Hit {
	match Date::from_calendar_date(year, month, 1) {
		Ok(first) => span_hit(first, month_end(year, month)),
		Err(_) => Hit::Invalid,
	}
}

fn year_hit(year: i32) -> Hit {
	match Date::from_calendar_date(year, Month::January, 1) {
		Ok(first) => span_hit(first, month_end(year, Month::December)),
		Err(_) => Hit::Invalid,
	}
}

fn month_end(year: i32, month: Month) -> Option<Date> {
	let (next_year, next_month) =
		if month == Month::December { (year + 1, Month::January) } else { (year, month.next()) };

	Date::from_calendar_date(next_year, next_month, 1).ok()?.previous_day()
}

/// Same day-of-month `months` months earlier, clamped to the shorter month.
fn shift_months(date: Date, months: i32) -> Option<Date> {
	let index = date.year() * 12 + i32::from(u8::from(date.month())) - 1 - months;
	let year = index.div_euclid(12);
	let month = Month::try_from(u8::try_from(index.rem_euclid(12) + 1).ok()?).ok()?;
	let last = month_end(year, month)?;

	Date::from_calendar_date(year, month, date.day().min(last.day())).ok()
}

fn monday_of(date: Date) -> Date {
	date.checked_sub(Duration::days(i64::from(date.weekday().number_days_from_monday())))
		.unwrap_or(date)
}

fn nth_weekday_of(year: i32, month: Month, weekday: Weekday, nth: u8) -> Option<Date> {
	let first = Date::from_calendar_date(year, month, 1).ok()?;
	let offset = (7 + weekday.number_days_from_monday() - first.weekday().number_days_from_monday())
		% 7;
	let date = first.checked_add(Duration::days(i64::from(offset) + 7 * i64::from(nth - 1)))?;

	(date.month() == month).then_some(date)
}

fn last_weekday_of(year: i32, month: Month, weekday: Weekday) -> Option<Date> {
	let last = month_end(year, month)?;
	let offset =
		(7 + last.weekday().number_days_from_monday() - weekday.number_days_from_monday()) % 7;

	last.checked_sub(Duration::days(i64::from(offset)))
}

fn thanksgiving(year: i32) -> Option<Date> {
	nth_weekday_of(year, Month::November, Weekday::Thursday, 4)
}

fn fixed(year: i32, month: Month, day: u8) -> Option<Date> {
	Date::from_calendar_date(year, month, day).ok()
}

fn calendar_date(year: i32, month: i32, day: i32) -> Option<Date> {
	let month = Month::try_from(u8::try_from(month).ok()?).ok()?;

	Date::from_calendar_date(year, month, u8::try_from(day).ok()?).ok()
}

fn number(caps: &Captures<'_>, idx: usize) -> Option<i32> {
	caps.get(idx)?.as_str().parse().ok()
}

fn month_from_name(name: &str) -> Option<Month> {
	let month = match name.trim_end_matches('.') {
		"january" | "jan" => Month::January,
		"february" | "feb" => Month::February,
		"march" | "mar" => Month::March,
		"april" | "apr" => Month::April,
		"may" => Month::May,
		"june" | "jun" => Month::June,
		"july" | "jul" => Month::July,
		"august" | "aug" => Month::August,
		"september" | "sept" | "sep" => Month::September,
		"october" | "oct" => Month::October,
		"november" | "nov" => Month::November,
		"december" | "dec" => Month::December,
		_ => return None,
	};

	Some(month)
}
