use std::{
	fmt::{self, Debug},
	time::Duration,
};
use time::OffsetDateTime;

/// Average length of a Gregorian year, used when a calendar shift is impossible.
const SECONDS_PER_YEAR: u64 = 31_556_952;

/// A point in time as Unix milliseconds, the unit of the `expires` column.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Timestamp(i64);

impl Timestamp {
	pub fn now() -> Timestamp {
		Timestamp::from_datetime(OffsetDateTime::now_utc())
	}

	pub fn from_millis(millis: i64) -> Timestamp {
		Timestamp(millis)
	}

	pub fn as_millis(&self) -> i64 {
		self.0
	}

	fn from_datetime(datetime: OffsetDateTime) -> Timestamp {
		Timestamp((datetime.unix_timestamp_nanos() / 1_000_000) as i64)
	}

	/// Saturating addition of a duration.
	#[must_use]
	pub fn plus(&self, duration: Duration) -> Timestamp {
		let millis = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
		Timestamp(self.0.saturating_add(millis))
	}

	/// Shift by whole calendar years, keeping month, day and time of day.
	///
	/// February 29th moves to February 28th in years without a leap day.
	#[must_use]
	pub fn plus_years(&self, years: u16) -> Timestamp {
		let fallback = self.plus(Duration::from_secs(u64::from(years) * SECONDS_PER_YEAR));
		let Ok(datetime) = OffsetDateTime::from_unix_timestamp_nanos(i128::from(self.0) * 1_000_000) else {
			return fallback;
		};
		let date = datetime.date();
		let year = date.year() + i32::from(years);
		let shifted = date
			.replace_year(year)
			.or_else(|_| date.replace_day(28).and_then(|date| date.replace_year(year)));
		match shifted {
			Ok(date) => Timestamp::from_datetime(datetime.replace_date(date)),
			Err(_) => fallback,
		}
	}
}

impl Debug for Timestamp {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Timestamp({})", self.0)
	}
}
