/// A value versioned by report step.
///
/// Only the steps where the value changes are stored; reading step `n`
/// returns the latest definition at or before `n`.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicState<T> {
    initial: T,
    changes: Vec<(usize, T)>,
}

impl<T: Clone + PartialEq> DynamicState<T> {
    pub fn new(initial: T) -> Self {
        Self {
            initial,
            changes: Vec::new(),
        }
    }

    pub fn get(&self, step: usize) -> &T {
        let index = self.changes.partition_point(|(changed_at, _)| *changed_at <= step);
        match index {
            0 => &self.initial,
            _ => &self.changes[index - 1].1,
        }
    }

    /// Sets the value from `step` onwards, discarding later definitions.
    ///
    /// Returns whether the value at `step` changed.
    pub fn update(&mut self, step: usize, value: T) -> bool {
        let changed = *self.get(step) != value;
        let keep = self.changes.partition_point(|(changed_at, _)| *changed_at < step);
        self.changes.truncate(keep);
        if *self.get(step) != value {
            self.changes.push((step, value));
        }
        changed
    }

    /// The first step at or after `from` where `predicate` holds.
    pub fn find_from(&self, from: usize, last: usize, predicate: impl Fn(&T) -> bool) -> Option<usize> {
        (from..=last).find(|step| predicate(self.get(*step)))
    }

    pub fn initial(&self) -> &T {
        &self.initial
    }

    /// Steps carrying an explicit definition.
    pub fn changed_steps(&self) -> impl Iterator<Item = usize> + '_ {
        self.changes.iter().map(|(step, _)| *step)
    }
}

#[cfg(test)]
mod tests {
    use super::DynamicState;

    #[test]
    fn values_are_forward_filled() {
        let mut state = DynamicState::new(0);
        assert!(state.update(4, 10));
        assert_eq!(*state.get(3), 0);
        assert_eq!(*state.get(4), 10);
        assert_eq!(*state.get(7), 10);
    }

    #[test]
    fn repeated_value_is_not_a_change() {
        let mut state = DynamicState::new("SHUT");
        assert!(!state.update(2, "SHUT"));
        assert!(state.update(2, "OPEN"));
        assert!(!state.update(2, "OPEN"));
        assert_eq!(state.changed_steps().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn update_discards_later_definitions() {
        let mut state = DynamicState::new(false);
        state.update(3, true);
        state.update(5, false);
        state.update(4, true);
        assert!(*state.get(9));
        assert!(!*state.get(2));
    }

    #[test]
    fn find_from_scans_forward() {
        let mut state = DynamicState::new("SHUT");
        state.update(6, "OPEN");
        assert_eq!(state.find_from(2, 10, |value| *value == "OPEN"), Some(6));
        assert_eq!(state.find_from(2, 5, |value| *value == "OPEN"), None);
    }
}
