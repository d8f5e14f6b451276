use crate::deck::DeckRecord;
use crate::domain::{EclError, ScheduleResult};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

fn month_number(name: &str) -> Option<u32> {
    let month = match name.trim().to_ascii_uppercase().as_str() {
        "JAN" => 1,
        "FEB" => 2,
        "MAR" => 3,
        "APR" => 4,
        "MAY" | "MAI" => 5,
        "JUN" => 6,
        "JUL" | "JLY" => 7,
        "AUG" => 8,
        "SEP" => 9,
        "OCT" | "OKT" => 10,
        "NOV" => 11,
        "DEC" | "DES" => 12,
        _ => return None,
    };
    Some(month)
}

fn time_of_day(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    if text.is_empty() {
        return NaiveTime::from_hms_opt(0, 0, 0);
    }
    NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .ok()
}

/// DAY, MONTH, YEAR and optional TIME items of a START or DATES record.
pub fn date_from_record(record: &DeckRecord) -> ScheduleResult<NaiveDateTime> {
    let day = record.item("DAY")?.get_int(0)?;
    let month_name = record.item("MONTH")?.get_string(0)?;
    let year = record.item("YEAR")?.get_int(0)?;
    let time = match record.item("TIME") {
        Ok(item) if item.has_value(0) => item.get_string(0)?.to_string(),
        _ => String::new(),
    };

    let invalid = || {
        EclError::invalid_input(
            "SCHEDULE.INVALID_DATE",
            format!("'{day} {month_name} {year} {time}' is not a valid date"),
        )
    };
    let month = month_number(month_name).ok_or_else(invalid)?;
    let day = u32::try_from(day).map_err(|_| invalid())?;
    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;
    let time = time_of_day(&time).ok_or_else(invalid)?;
    Ok(date.and_time(time))
}

/// Report step boundaries. Step 0 is the simulation start; step `n` ends at
/// `time(n)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeMap {
    times: Vec<NaiveDateTime>,
}

impl TimeMap {
    pub fn new(start: NaiveDateTime) -> Self {
        Self { times: vec![start] }
    }

    pub fn default_start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(1983, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap_or_default()
    }

    fn last(&self) -> NaiveDateTime {
        self.times.last().copied().unwrap_or_else(Self::default_start)
    }

    pub fn add_time(&mut self, time: NaiveDateTime) -> ScheduleResult<()> {
        let last = self.last();
        if time <= last {
            return Err(EclError::structural(
                "SCHEDULE.TIME_NOT_MONOTONE",
                format!("report time {time} is not after the previous report time {last}"),
            ));
        }
        self.times.push(time);
        Ok(())
    }

    /// Appends a step `days` after the last one. Steps that are not finite or
    /// that leave the representable calendar are rejected.
    pub fn add_days(&mut self, days: f64) -> ScheduleResult<()> {
        if !days.is_finite() {
            return Err(EclError::invalid_input(
                "SCHEDULE.TIME_STEP_RANGE",
                format!("time step of {days} days is not a finite number"),
            ));
        }
        if days <= 0.0 {
            return Err(EclError::structural(
                "SCHEDULE.TIME_NOT_MONOTONE",
                format!("time step of {days} days must be positive"),
            ));
        }
        let last = self.last();
        let millis = (days * 86_400_000.0).round();
        let next = (millis < i64::MAX as f64)
            .then_some(millis as i64)
            .and_then(TimeDelta::try_milliseconds)
            .and_then(|step| last.checked_add_signed(step))
            .ok_or_else(|| {
                EclError::invalid_input(
                    "SCHEDULE.TIME_STEP_RANGE",
                    format!("time step of {days} days after {last} leaves the calendar"),
                )
            })?;
        self.add_time(next)
    }

    pub fn start_time(&self) -> NaiveDateTime {
        self.times[0]
    }

    /// End of report step `step`.
    pub fn time(&self, step: usize) -> Option<NaiveDateTime> {
        self.times.get(step).copied()
    }

    /// Number of entries, one more than the number of report steps.
    pub fn size(&self) -> usize {
        self.times.len()
    }

    pub fn num_timesteps(&self) -> usize {
        self.times.len() - 1
    }

    pub fn last_step(&self) -> usize {
        self.num_timesteps()
    }

    pub fn seconds_until(&self, step: usize) -> Option<f64> {
        let time = self.time(step)?;
        Some((time - self.start_time()).num_milliseconds() as f64 / 1000.0)
    }

    pub fn days_until(&self, step: usize) -> Option<f64> {
        self.seconds_until(step).map(|seconds| seconds / 86_400.0)
    }

    /// Whether `step` ends in a different month than the step before it.
    pub fn is_first_in_month(&self, step: usize) -> bool {
        match (step.checked_sub(1).and_then(|prev| self.time(prev)), self.time(step)) {
            (Some(prev), Some(time)) => (prev.year(), prev.month()) != (time.year(), time.month()),
            (None, Some(_)) => true,
            _ => false,
        }
    }

    pub fn is_first_in_year(&self, step: usize) -> bool {
        match (step.checked_sub(1).and_then(|prev| self.time(prev)), self.time(step)) {
            (Some(prev), Some(time)) => prev.year() != time.year(),
            (None, Some(_)) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{TimeMap, month_number, time_of_day};
    use chrono::NaiveDate;

    fn start() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2000, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .expect("valid date")
    }

    #[test]
    fn month_aliases_are_accepted() {
        assert_eq!(month_number("JLY"), Some(7));
        assert_eq!(month_number("okt"), Some(10));
        assert_eq!(month_number("DES"), Some(12));
        assert_eq!(month_number("XYZ"), None);
    }

    #[test]
    fn time_item_accepts_fractions() {
        let time = time_of_day("12:30:15.500").expect("valid time");
        assert_eq!(time.format("%H:%M:%S").to_string(), "12:30:15");
    }

    #[test]
    fn steps_accumulate_days() {
        let mut map = TimeMap::new(start());
        map.add_days(10.0).expect("positive step");
        map.add_days(21.0).expect("positive step");
        assert_eq!(map.num_timesteps(), 2);
        assert_eq!(map.days_until(2), Some(31.0));
        assert!(map.is_first_in_month(2));
        assert!(!map.is_first_in_month(1));
    }

    #[test]
    fn non_increasing_times_are_rejected() {
        let mut map = TimeMap::new(start());
        let error = map.add_time(start()).expect_err("same time must fail");
        assert_eq!(error.placeholder(), "SCHEDULE.TIME_NOT_MONOTONE");
        assert!(map.add_days(0.0).is_err());
        assert!(map.add_days(-1.0).is_err());
    }

    #[test]
    fn steps_beyond_the_calendar_are_errors() {
        let mut map = TimeMap::new(start());
        for days in [1e12, 1e300, f64::INFINITY, f64::NAN] {
            let error = map.add_days(days).expect_err("step must be rejected");
            assert_eq!(error.placeholder(), "SCHEDULE.TIME_STEP_RANGE", "{days}");
        }
        assert_eq!(map.num_timesteps(), 0);
        map.add_days(1.5).expect("ordinary step");
        assert_eq!(map.days_until(1), Some(1.5));
    }
}
