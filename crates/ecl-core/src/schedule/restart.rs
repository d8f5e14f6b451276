use super::TimeMap;
use crate::domain::{EclError, ScheduleResult};
use serde::Serialize;

/// Restart file output requested by RPTRST and RPTSCHED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RestartSchedule {
    /// Report step the BASIC setting took effect.
    pub since: usize,
    pub basic: u32,
    pub frequency: u32,
    /// RESTART of RPTSCHED. A positive value writes every report step.
    pub rptsched_restart: Option<u32>,
}

fn mnemonic_value(keyword: &str, mnemonic: &str, value: &str) -> ScheduleResult<u32> {
    value.trim().parse().map_err(|_| {
        EclError::invalid_input(
            "SCHEDULE.INVALID_RESTART_MNEMONIC",
            format!("{keyword} mnemonic {mnemonic} has value '{value}', expected a count"),
        )
    })
}

/// Integer controls, when every token is a number.
fn integer_controls(tokens: &[&str]) -> Option<Vec<u32>> {
    tokens.iter().map(|token| token.parse().ok()).collect()
}

impl RestartSchedule {
    /// Restart setting from the RPTRST mnemonics given at `step`, or `None`
    /// when they carry no BASIC setting.
    pub fn from_rptrst(tokens: &[&str], step: usize) -> ScheduleResult<Option<Self>> {
        let mut basic = None;
        let mut frequency = 0;
        match integer_controls(tokens) {
            Some(controls) if !controls.is_empty() => {
                basic = controls.first().copied().filter(|basic| *basic != 0);
                frequency = controls.get(5).copied().unwrap_or(0);
            }
            _ => {
                for token in tokens {
                    match token.split_once('=') {
                        Some(("BASIC", value)) => {
                            basic = Some(mnemonic_value("RPTRST", "BASIC", value)?)
                        }
                        Some(("FREQ", value)) => {
                            frequency = mnemonic_value("RPTRST", "FREQ", value)?
                        }
                        _ => {}
                    }
                }
            }
        }

        let Some(basic) = basic else {
            return Ok(None);
        };
        if basic > 5 {
            return Err(EclError::unsupported(
                "SCHEDULE.UNSUPPORTED_RESTART_BASIC",
                format!("RPTRST BASIC={basic} is not supported"),
            ));
        }
        if basic > 2 {
            frequency = frequency.max(1);
        }
        Ok(Some(Self {
            since: step,
            basic,
            frequency,
            rptsched_restart: None,
        }))
    }

    /// Applies the RESTART setting of RPTSCHED, or `None` when the
    /// mnemonics do not mention restart output.
    pub fn with_rptsched(&self, tokens: &[&str]) -> ScheduleResult<Option<Self>> {
        let restart = match integer_controls(tokens) {
            Some(controls) if !controls.is_empty() => controls.get(6).copied(),
            _ => {
                let mut restart = None;
                for token in tokens {
                    match token.split_once('=') {
                        Some(("RESTART", value)) => {
                            restart = Some(mnemonic_value("RPTSCHED", "RESTART", value)?)
                        }
                        None if *token == "NOTHING" => restart = Some(0),
                        _ => {}
                    }
                }
                restart
            }
        };
        Ok(restart.map(|restart| Self {
            rptsched_restart: Some(restart),
            ..*self
        }))
    }

    /// Whether a restart file is written at the end of `step`.
    pub fn writes_at(&self, step: usize, time_map: &TimeMap) -> bool {
        if self.rptsched_restart.is_some_and(|restart| restart > 0) {
            return true;
        }
        let frequency = self.frequency.max(1) as usize;
        match self.basic {
            1 | 2 => true,
            3 => step >= self.since && (step - self.since) % frequency == 0,
            4 => self.nth_boundary(step, frequency, |step| time_map.is_first_in_year(step)),
            5 => self.nth_boundary(step, frequency, |step| time_map.is_first_in_month(step)),
            _ => false,
        }
    }

    /// True on every `frequency`'th step that opens a new year or month,
    /// counted from `since`.
    fn nth_boundary(&self, step: usize, frequency: usize, is_first: impl Fn(usize) -> bool) -> bool {
        if step < self.since || !is_first(step) {
            return false;
        }
        let count = (self.since..=step).filter(|step| is_first(*step)).count();
        (count - 1) % frequency == 0
    }
}

#[cfg(test)]
mod tests {
    use super::RestartSchedule;
    use crate::schedule::TimeMap;
    use chrono::NaiveDate;

    fn monthly_map(months: u32) -> TimeMap {
        let start = NaiveDate::from_ymd_opt(2000, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .expect("valid start");
        let mut map = TimeMap::new(start);
        for month in 1..=months {
            let year = 2000 + (month / 12) as i32;
            let time = NaiveDate::from_ymd_opt(year, month % 12 + 1, 1)
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .expect("valid report date");
            map.add_time(time).expect("dates increase");
        }
        map
    }

    #[test]
    fn mnemonics_and_integer_controls_agree() {
        let named = RestartSchedule::from_rptrst(&["BASIC=3", "FREQ=2"], 1)
            .expect("mnemonics are valid")
            .expect("BASIC is given");
        let integers = RestartSchedule::from_rptrst(&["3", "0", "0", "0", "0", "2"], 1)
            .expect("controls are valid")
            .expect("BASIC is given");
        assert_eq!(named, integers);
        assert_eq!((named.basic, named.frequency), (3, 2));
    }

    #[test]
    fn mnemonics_without_basic_change_nothing() {
        let unchanged = RestartSchedule::from_rptrst(&["PRES", "SWAT"], 1).expect("mnemonics are valid");
        assert!(unchanged.is_none());
        let error = RestartSchedule::from_rptrst(&["BASIC=X"], 1).expect_err("X is not a count");
        assert_eq!(error.placeholder(), "SCHEDULE.INVALID_RESTART_MNEMONIC");
    }

    #[test]
    fn yearly_output_skips_to_every_nth_year() {
        let map = monthly_map(36);
        let schedule = RestartSchedule::from_rptrst(&["BASIC=4", "FREQ=2"], 1)
            .expect("mnemonics are valid")
            .expect("BASIC is given");
        let written: Vec<usize> = (0..=map.last_step())
            .filter(|step| schedule.writes_at(*step, &map))
            .collect();
        assert_eq!(written, vec![12, 36]);
    }

    #[test]
    fn rptsched_restart_forces_output() {
        let map = monthly_map(4);
        let schedule = RestartSchedule::default()
            .with_rptsched(&["RESTART=1"])
            .expect("mnemonics are valid")
            .expect("RESTART is given");
        assert!(schedule.writes_at(3, &map));
        let silenced = schedule
            .with_rptsched(&["NOTHING"])
            .expect("mnemonics are valid")
            .expect("NOTHING sets RESTART");
        assert!(!silenced.writes_at(3, &map));
    }
}
