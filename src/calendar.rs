use chrono::{Datelike, Duration, NaiveDate, Weekday};


/// How a date column is written in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
	/// `2020-03-27`
	Iso,
	/// `2020-03-27 00:00:00` or `2020/03/27 00:00:00`
	IsoDateTime,
	/// `27/03/2020`
	DayMonthYear,
	/// `27-Mar-20` or `27-Mar-2020`
	DayMonthName,
	/// `2020-W13`, placed on the given weekday of that ISO week
	IsoWeek(Weekday),
	/// milliseconds since the unix epoch, as found in JSON payloads
	EpochMillis,
	/// try every textual format in turn
	Auto,
}

fn parse_iso(s: &str) -> Option<NaiveDate> {
	NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDate> {
	if s.len() != 19 || !s.is_char_boundary(10) {
		return None
	}
	let s = s[..10].replace("/", "-");
	parse_iso(&s)
}

fn parse_day_month_year(s: &str) -> Option<NaiveDate> {
	NaiveDate::parse_from_str(s, "%d/%m/%Y").ok()
}

fn parse_day_month_name(s: &str) -> Option<NaiveDate> {
	let (_, _, year) = {
		let mut parts = s.splitn(3, '-');
		(parts.next()?, parts.next()?, parts.next()?)
	};
	if year.len() == 2 {
		NaiveDate::parse_from_str(s, "%d-%b-%y").ok()
	} else {
		NaiveDate::parse_from_str(s, "%d-%b-%Y").ok()
	}
}

fn parse_iso_week(s: &str, weekday: Weekday) -> Option<NaiveDate> {
	let (year, week) = s.split_once("-W")?;
	let year = year.parse::<i32>().ok()?;
	let week = week.parse::<u32>().ok()?;
	NaiveDate::from_isoywd_opt(year, week, weekday)
}

fn parse_epoch_millis(s: &str) -> Option<NaiveDate> {
	let ms = match s.parse::<i64>() {
		Ok(v) => v,
		Err(_) => {
			let v = s.parse::<f64>().ok()?;
			if !v.is_finite() {
				return None
			}
			v as i64
		},
	};
	let days = ms.div_euclid(86_400_000);
	epoch().checked_add_signed(Duration::days(days))
}

fn epoch() -> NaiveDate {
	NaiveDate::from_ymd(1970, 1, 1)
}

/// Parse `s` according to `format`, returning `None` if it does not match.
pub fn parse_date(s: &str, format: DateFormat) -> Option<NaiveDate> {
	let s = s.trim();
	match format {
		DateFormat::Iso => parse_iso(s),
		DateFormat::IsoDateTime => parse_iso_datetime(s),
		DateFormat::DayMonthYear => parse_day_month_year(s),
		DateFormat::DayMonthName => parse_day_month_name(s),
		DateFormat::IsoWeek(wd) => parse_iso_week(s, wd),
		DateFormat::EpochMillis => parse_epoch_millis(s),
		DateFormat::Auto => parse_iso(s)
			.or_else(|| parse_iso_datetime(s))
			.or_else(|| parse_day_month_year(s))
			.or_else(|| parse_day_month_name(s)),
	}
}

/// The first date on or after `date` falling on `weekday`.
pub fn week_ending(date: NaiveDate, weekday: Weekday) -> NaiveDate {
	let target = weekday.num_days_from_monday() as i64;
	let current = date.weekday().num_days_from_monday() as i64;
	date + Duration::days((target - current).rem_euclid(7))
}


/// A regular time axis of `len` slots, `step` days apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
	start: NaiveDate,
	step: i64,
	len: usize,
}

impl Calendar {
	/// Axis covering `start..end` (exclusive) in steps of `step` days.
	pub fn new(start: NaiveDate, end: NaiveDate, step: u32) -> Self {
		assert!(step > 0);
		let step = step as i64;
		let days = (end - start).num_days();
		let len = if days <= 0 {
			0
		} else {
			((days + step - 1) / step) as usize
		};
		Self{start, step, len}
	}

	/// Smallest axis starting at the earliest date and including the latest.
	pub fn spanning<I: IntoIterator<Item = NaiveDate>>(dates: I, step: u32) -> Option<Self> {
		let mut bounds: Option<(NaiveDate, NaiveDate)> = None;
		for d in dates {
			bounds = Some(match bounds {
				None => (d, d),
				Some((lo, hi)) => (lo.min(d), hi.max(d)),
			});
		}
		let (lo, hi) = bounds?;
		Some(Self::new(lo, hi + Duration::days(1), step))
	}

	#[inline(always)]
	pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
		let days = (date - self.start).num_days();
		if days < 0 || days % self.step != 0 {
			return None
		}
		let i = (days / self.step) as usize;
		if i >= self.len {
			return None
		}
		Some(i)
	}

	#[inline(always)]
	pub fn date_at(&self, i: usize) -> Option<NaiveDate> {
		if i >= self.len {
			return None
		}
		Some(self.start + Duration::days(i as i64 * self.step))
	}

	#[inline(always)]
	pub fn start(&self) -> NaiveDate {
		self.start
	}

	#[inline(always)]
	pub fn step(&self) -> i64 {
		self.step
	}

	#[inline(always)]
	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
		(0..self.len).filter_map(move |i| self.date_at(i))
	}
}
