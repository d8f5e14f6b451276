use super::smspec::SummarySpec;
use crate::domain::{EclError, SummaryResult};
use crate::ecl_file::{EclData, EclFile, EclKeyword};

/// One PARAMS row.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryStep {
    report_step: i32,
    ministep: i32,
    sim_days: f64,
    values: Vec<f32>,
}

impl SummaryStep {
    pub fn report_step(&self) -> i32 {
        self.report_step
    }

    pub fn ministep(&self) -> i32 {
        self.ministep
    }

    pub fn sim_days(&self) -> f64 {
        self.sim_days
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn get(&self, params_index: usize) -> Option<f32> {
        self.values.get(params_index).copied()
    }

    pub fn set(&mut self, params_index: usize, value: f32) -> SummaryResult<()> {
        let width = self.values.len();
        let slot = self.values.get_mut(params_index).ok_or_else(|| {
            EclError::invalid_input(
                "SUMMARY.COLUMN_RANGE",
                format!("column {params_index} is outside a row of width {width}"),
            )
        })?;
        *slot = value;
        Ok(())
    }
}

/// A summary header together with its data rows.
///
/// Rows start out as a copy of the column defaults, so a column never written
/// for a step reports its registered default.
#[derive(Debug, Clone)]
pub struct SummaryData {
    spec: SummarySpec,
    steps: Vec<SummaryStep>,
}

impl SummaryData {
    pub fn new(spec: SummarySpec) -> Self {
        Self {
            spec,
            steps: Vec::new(),
        }
    }

    pub fn spec(&self) -> &SummarySpec {
        &self.spec
    }

    /// Mutable header access; inserts fail once the first row exists.
    pub fn spec_mut(&mut self) -> &mut SummarySpec {
        &mut self.spec
    }

    pub fn steps(&self) -> &[SummaryStep] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&SummaryStep> {
        self.steps.get(index)
    }

    pub fn num_steps(&self) -> usize {
        self.steps.len()
    }

    /// Locks the header and appends a row for `report_step` at `sim_days`.
    pub fn add_step(&mut self, report_step: i32, sim_days: f64) -> &mut SummaryStep {
        self.spec.lock();
        let ministep = self
            .steps
            .last()
            .map_or(0, |previous| previous.ministep + 1);

        let mut values = self.spec.params_default().to_vec();
        if let Some(time_index) = self.spec.time_index() {
            let seconds = self.spec.time_seconds().unwrap_or(86_400.0);
            if let Some(slot) = values.get_mut(time_index) {
                *slot = (sim_days * 86_400.0 / seconds) as f32;
            }
        }

        tracing::trace!(report_step, ministep, sim_days, "appending summary row");
        self.steps.push(SummaryStep {
            report_step,
            ministep,
            sim_days,
            values,
        });
        let last = self.steps.len() - 1;
        &mut self.steps[last]
    }

    fn step_or_error(&self, step: usize) -> SummaryResult<&SummaryStep> {
        self.steps.get(step).ok_or_else(|| {
            EclError::invalid_input(
                "SUMMARY.STEP_RANGE",
                format!("step {step} does not exist, {} steps stored", self.steps.len()),
            )
        })
    }

    /// The value of `key` at `step`, or `None` when either is unknown.
    pub fn get_general(&self, step: usize, key: &str) -> Option<f32> {
        let index = self.spec.lookup_general(key)?.params_index()?;
        self.steps.get(step)?.get(index)
    }

    pub fn set_general(&mut self, step: usize, key: &str, value: f32) -> SummaryResult<()> {
        self.step_or_error(step)?;
        let index = self
            .spec
            .lookup_general(key)
            .and_then(|node| node.params_index())
            .ok_or_else(|| {
                EclError::invalid_input(
                    "SMSPEC.UNKNOWN_KEY",
                    format!("summary key '{key}' does not exist"),
                )
            })?;
        self.steps[step].set(index, value)
    }

    /// The vector of `key` over all rows.
    pub fn series(&self, key: &str) -> Option<Vec<f32>> {
        let index = self.spec.lookup_general(key)?.params_index()?;
        self.steps.iter().map(|step| step.get(index)).collect()
    }

    /// UNSMRY layout: SEQHDR at each new report step, then MINISTEP and
    /// PARAMS per row.
    pub fn to_ecl_file(&self) -> EclFile {
        let mut file = EclFile::default();
        let mut current_report = None;
        for step in &self.steps {
            if current_report != Some(step.report_step) {
                file.push(EclKeyword::new("SEQHDR", EclData::Int(vec![0])));
                current_report = Some(step.report_step);
            }
            file.push(EclKeyword::new("MINISTEP", EclData::Int(vec![step.ministep])));
            file.push(EclKeyword::new("PARAMS", EclData::Real(step.values.clone())));
        }
        file
    }
}
