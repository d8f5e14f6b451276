use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleEvent {
    NewWell,
    NewGroup,
    WellStatusChange,
    ProductionUpdate,
    InjectionUpdate,
    CompletionChange,
    GroupChange,
    GeoModifier,
    TuningChange,
}

impl ScheduleEvent {
    pub const ALL: [ScheduleEvent; 9] = [
        Self::NewWell,
        Self::NewGroup,
        Self::WellStatusChange,
        Self::ProductionUpdate,
        Self::InjectionUpdate,
        Self::CompletionChange,
        Self::GroupChange,
        Self::GeoModifier,
        Self::TuningChange,
    ];

    pub const fn bit(self) -> u32 {
        match self {
            Self::NewWell => 1,
            Self::NewGroup => 1 << 1,
            Self::WellStatusChange => 1 << 2,
            Self::ProductionUpdate => 1 << 3,
            Self::InjectionUpdate => 1 << 4,
            Self::CompletionChange => 1 << 5,
            Self::GroupChange => 1 << 6,
            Self::GeoModifier => 1 << 7,
            Self::TuningChange => 1 << 8,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NewWell => "NEW_WELL",
            Self::NewGroup => "NEW_GROUP",
            Self::WellStatusChange => "WELL_STATUS_CHANGE",
            Self::ProductionUpdate => "PRODUCTION_UPDATE",
            Self::InjectionUpdate => "INJECTION_UPDATE",
            Self::CompletionChange => "COMPLETION_CHANGE",
            Self::GroupChange => "GROUP_CHANGE",
            Self::GeoModifier => "GEO_MODIFIER",
            Self::TuningChange => "TUNING_CHANGE",
        }
    }
}

/// Per-step event bitmask. Events are recorded at one step only and never
/// removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Events {
    masks: BTreeMap<usize, u32>,
}

impl Events {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_event(&mut self, event: ScheduleEvent, step: usize) {
        *self.masks.entry(step).or_default() |= event.bit();
    }

    pub fn has_event(&self, event: ScheduleEvent, step: usize) -> bool {
        self.events_at(step) & event.bit() != 0
    }

    pub fn events_at(&self, step: usize) -> u32 {
        self.masks.get(&step).copied().unwrap_or(0)
    }

    pub fn steps_with(&self, event: ScheduleEvent) -> Vec<usize> {
        self.masks
            .iter()
            .filter(|(_, mask)| *mask & event.bit() != 0)
            .map(|(step, _)| *step)
            .collect()
    }

    /// Event names present at `step`, in declaration order.
    pub fn names_at(&self, step: usize) -> Vec<&'static str> {
        ScheduleEvent::ALL
            .iter()
            .filter(|event| self.has_event(**event, step))
            .map(|event| event.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Events, ScheduleEvent};

    #[test]
    fn adding_twice_sets_one_bit() {
        let mut events = Events::new();
        events.add_event(ScheduleEvent::WellStatusChange, 3);
        events.add_event(ScheduleEvent::WellStatusChange, 3);
        assert_eq!(events.events_at(3), ScheduleEvent::WellStatusChange.bit());
        assert!(!events.has_event(ScheduleEvent::WellStatusChange, 4));
    }

    #[test]
    fn steps_with_lists_every_occurrence() {
        let mut events = Events::new();
        events.add_event(ScheduleEvent::NewWell, 0);
        events.add_event(ScheduleEvent::GeoModifier, 2);
        events.add_event(ScheduleEvent::NewWell, 5);
        assert_eq!(events.steps_with(ScheduleEvent::NewWell), vec![0, 5]);
        assert_eq!(events.names_at(2), vec!["GEO_MODIFIER"]);
    }

    #[test]
    fn bits_are_distinct() {
        let combined = ScheduleEvent::ALL.iter().fold(0, |mask, event| mask | event.bit());
        assert_eq!(combined.count_ones() as usize, ScheduleEvent::ALL.len());
    }
}
