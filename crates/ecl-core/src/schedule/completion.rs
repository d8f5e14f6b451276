use crate::domain::{EclError, ScheduleResult};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CompletionState {
    Open,
    Shut,
    Auto,
}

impl CompletionState {
    pub fn parse(text: &str) -> ScheduleResult<Self> {
        match text {
            "OPEN" => Ok(Self::Open),
            "SHUT" => Ok(Self::Shut),
            "AUTO" => Ok(Self::Auto),
            other => Err(EclError::invalid_input(
                "SCHEDULE.INVALID_STATE",
                format!("'{other}' is not a completion state"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CompletionOrder {
    #[default]
    Track,
    Input,
    Depth,
}

impl CompletionOrder {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "TRACK" => Some(Self::Track),
            "INPUT" => Some(Self::Input),
            "DEPTH" => Some(Self::Depth),
            _ => None,
        }
    }
}

/// One connection between a well and a grid cell. Cell indices are 0-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Completion {
    pub i: i32,
    pub j: i32,
    pub k: i32,
    pub state: CompletionState,
    pub sat_table: i32,
    pub connection_factor: Option<f64>,
    pub diameter: Option<f64>,
    pub skin: f64,
    pub direction: String,
    pub well_pi: f64,
    /// Segment the connection drains into, set by COMPSEGS.
    pub segment_number: Option<i32>,
    pub center_depth: Option<f64>,
}

impl Completion {
    pub fn new(i: i32, j: i32, k: i32, state: CompletionState) -> Self {
        Self {
            i,
            j,
            k,
            state,
            sat_table: 0,
            connection_factor: None,
            diameter: None,
            skin: 0.0,
            direction: "Z".to_string(),
            well_pi: 1.0,
            segment_number: None,
            center_depth: None,
        }
    }

    pub fn same_cell(&self, other: &Completion) -> bool {
        (self.i, self.j, self.k) == (other.i, other.j, other.k)
    }
}

/// Completions of one well in input order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CompletionSet {
    completions: Vec<Completion>,
}

impl CompletionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the completion in the same cell, or appends.
    pub fn add(&mut self, completion: Completion) {
        match self
            .completions
            .iter_mut()
            .find(|existing| existing.same_cell(&completion))
        {
            Some(existing) => *existing = completion,
            None => self.completions.push(completion),
        }
    }

    pub fn get(&self, index: usize) -> Option<&Completion> {
        self.completions.get(index)
    }

    pub fn find_mut(&mut self, i: i32, j: i32, k: i32) -> Option<&mut Completion> {
        self.completions
            .iter_mut()
            .find(|completion| (completion.i, completion.j, completion.k) == (i, j, k))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Completion> {
        self.completions.iter()
    }

    pub fn len(&self) -> usize {
        self.completions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.completions.is_empty()
    }

    /// True for an empty set as well.
    pub fn all_shut(&self) -> bool {
        self.completions
            .iter()
            .all(|completion| completion.state == CompletionState::Shut)
    }
}

impl FromIterator<Completion> for CompletionSet {
    fn from_iter<I: IntoIterator<Item = Completion>>(iter: I) -> Self {
        let mut set = Self::new();
        for completion in iter {
            set.add(completion);
        }
        set
    }
}

/// Selects completions by 0-based position range and cell; `None` matches
/// anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompletionFilter {
    pub i: Option<i32>,
    pub j: Option<i32>,
    pub k: Option<i32>,
    pub first: Option<usize>,
    pub last: Option<usize>,
}

impl CompletionFilter {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, position: usize, completion: &Completion) -> bool {
        if self.first.is_some_and(|first| position < first) {
            return false;
        }
        if self.last.is_some_and(|last| position > last) {
            return false;
        }
        self.i.is_none_or(|i| i == completion.i)
            && self.j.is_none_or(|j| j == completion.j)
            && self.k.is_none_or(|k| k == completion.k)
    }

    /// Copy of `set` with `change` applied to every matching completion.
    pub fn apply(&self, set: &CompletionSet, change: impl Fn(&mut Completion)) -> CompletionSet {
        let mut updated = set.clone();
        for (position, completion) in updated.completions.iter_mut().enumerate() {
            if self.matches(position, completion) {
                change(completion);
            }
        }
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::{Completion, CompletionFilter, CompletionSet, CompletionState};

    fn set() -> CompletionSet {
        (0..4)
            .map(|k| Completion::new(1, 1, k, CompletionState::Open))
            .collect()
    }

    #[test]
    fn same_cell_replaces_existing_completion() {
        let mut set = set();
        set.add(Completion::new(1, 1, 2, CompletionState::Shut));
        assert_eq!(set.len(), 4);
        assert_eq!(set.get(2).map(|c| c.state), Some(CompletionState::Shut));
    }

    #[test]
    fn filter_uses_position_and_cell() {
        let filter = CompletionFilter {
            first: Some(1),
            last: Some(2),
            ..CompletionFilter::default()
        };
        let shut = filter.apply(&set(), |completion| completion.state = CompletionState::Shut);
        let states: Vec<_> = shut.iter().map(|c| c.state).collect();
        assert_eq!(
            states,
            vec![
                CompletionState::Open,
                CompletionState::Shut,
                CompletionState::Shut,
                CompletionState::Open
            ]
        );

        let by_layer = CompletionFilter {
            k: Some(3),
            ..CompletionFilter::default()
        };
        let scaled = by_layer.apply(&set(), |completion| completion.well_pi *= 2.0);
        assert_eq!(scaled.get(3).map(|c| c.well_pi), Some(2.0));
        assert_eq!(scaled.get(0).map(|c| c.well_pi), Some(1.0));
    }

    #[test]
    fn empty_set_counts_as_all_shut() {
        assert!(CompletionSet::new().all_shut());
        assert!(!set().all_shut());
    }

    #[test]
    fn unknown_state_is_invalid_input() {
        let error = CompletionState::parse("STOP").expect_err("STOP is a well status only");
        assert_eq!(error.placeholder(), "SCHEDULE.INVALID_STATE");
    }
}
