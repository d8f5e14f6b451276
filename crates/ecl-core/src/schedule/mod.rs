//! Time-resolved well, group and completion state built from the SCHEDULE
//! section of a deck.
//!
//! The section is walked in file order. DATES and TSTEP advance the current
//! report step; every other keyword is dispatched to its handler in a
//! [`HandlerRegistry`]. Values are forward-filled: reading step `n` returns
//! the last definition at or before `n`.

mod completion;
mod dynamic_state;
mod events;
mod group;
mod handlers;
mod restart;
mod segments;
mod time_map;
mod tuning;
mod well;

pub use completion::{Completion, CompletionFilter, CompletionOrder, CompletionSet, CompletionState};
pub use dynamic_state::DynamicState;
pub use events::{Events, ScheduleEvent};
pub use group::{
    ExceedAction, FIELD, Group, GroupInjectionControl, GroupInjectionTargets,
    GroupProductionControl, GroupProductionTargets, GroupTree,
};
pub use handlers::{HandlerRegistry, KeywordHandler};
pub use restart::RestartSchedule;
pub use segments::{Segment, SegmentInfo, SegmentRange, SegmentSet};
pub use time_map::{TimeMap, date_from_record};
pub use tuning::Tuning;
pub use well::{
    GuideRate, GuideRatePhase, InjectionProperties, InjectorControl, InjectorType, Phase,
    PolymerProperties, ProducerControl, ProductionProperties, Well, WellSpec, WellStatus,
};

use crate::common::{MessageContainer, ParseConfig};
use crate::deck::{Deck, DeckKeyword};
use crate::domain::{EclError, ScheduleResult};
use crate::schema::Section;
use crate::units::UnitSystem;
use chrono::NaiveDateTime;
use globset::Glob;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Dissolution and vaporization controls from DRSDT, DRVDT and VAPPARS.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "keyword", rename_all = "UPPERCASE")]
pub enum OilVaporization {
    Drsdt { max_rate: f64, all_cells: bool },
    Drvdt { max_rate: f64 },
    Vappars { vap1: f64, vap2: f64 },
}

#[derive(Debug, Clone)]
pub struct Schedule {
    time_map: TimeMap,
    units: UnitSystem,
    config: ParseConfig,
    wells: Vec<Well>,
    well_index: HashMap<String, usize>,
    groups: Vec<Group>,
    group_index: HashMap<String, usize>,
    group_tree: DynamicState<GroupTree>,
    events: Events,
    messages: MessageContainer,
    modifier_decks: BTreeMap<usize, Deck>,
    oil_vaporization: DynamicState<Option<OilVaporization>>,
    tuning: DynamicState<Tuning>,
    restart: DynamicState<RestartSchedule>,
    nosim: bool,
    has_complump: bool,
    completion_orders: BTreeMap<usize, Vec<(String, CompletionOrder)>>,
    deferred_rft: Vec<(DeckKeyword, usize)>,
    deferred_restart: Vec<(DeckKeyword, usize)>,
}

/// Report step of every SCHEDULE keyword, counted before the walk.
fn keyword_steps(keywords: &[&DeckKeyword]) -> ScheduleResult<Vec<usize>> {
    let mut step = 0;
    let mut steps = Vec::with_capacity(keywords.len());
    for keyword in keywords {
        steps.push(step);
        match keyword.name() {
            "DATES" => step += keyword.len(),
            "TSTEP" => step += keyword.record(0)?.item("step_list")?.len(),
            _ => {}
        }
    }
    Ok(steps)
}

impl Schedule {
    pub fn new(deck: &Deck, config: &ParseConfig) -> ScheduleResult<Self> {
        Self::with_handlers(deck, config, HandlerRegistry::shared())
    }

    pub fn with_handlers(
        deck: &Deck,
        config: &ParseConfig,
        handlers: &HandlerRegistry,
    ) -> ScheduleResult<Self> {
        let start = match deck.last_keyword("START") {
            Some(keyword) => date_from_record(keyword.record(0)?)
                .map_err(|error| error.or_at(keyword.location()))?,
            None => TimeMap::default_start(),
        };
        let keywords: Vec<&DeckKeyword> = deck.section_keywords(Section::Schedule).collect();

        let mut schedule = Self {
            time_map: TimeMap::new(start),
            units: deck.unit_system(),
            config: config.clone(),
            wells: Vec::new(),
            well_index: HashMap::new(),
            groups: Vec::new(),
            group_index: HashMap::new(),
            group_tree: DynamicState::new(GroupTree::new()),
            events: Events::new(),
            messages: MessageContainer::new(),
            modifier_decks: BTreeMap::new(),
            oil_vaporization: DynamicState::new(None),
            tuning: DynamicState::new(Tuning::default()),
            restart: DynamicState::new(RestartSchedule::default()),
            nosim: deck.has_keyword("NOSIM"),
            has_complump: keywords.iter().any(|keyword| keyword.name() == "COMPLUMP"),
            completion_orders: BTreeMap::new(),
            deferred_rft: Vec::new(),
            deferred_restart: Vec::new(),
        };
        schedule.add_group(FIELD, 0);
        schedule.collect_completion_orders(&keywords)?;

        let mut step = 0;
        for keyword in &keywords {
            schedule
                .apply_keyword(keyword, handlers, &mut step)
                .map_err(|error| error.or_at(keyword.location()))?;
        }

        for (keyword, step) in std::mem::take(&mut schedule.deferred_rft) {
            handlers::apply_rft(&keyword, &mut schedule, step)
                .map_err(|error| error.or_at(keyword.location()))?;
        }

        for (keyword, step) in std::mem::take(&mut schedule.deferred_restart) {
            handlers::apply_restart(&keyword, &mut schedule, step)
                .map_err(|error| error.or_at(keyword.location()))?;
        }

        tracing::debug!(
            steps = schedule.num_timesteps(),
            wells = schedule.wells.len(),
            groups = schedule.groups.len(),
            "schedule built"
        );
        Ok(schedule)
    }

    fn apply_keyword(
        &mut self,
        keyword: &DeckKeyword,
        handlers: &HandlerRegistry,
        step: &mut usize,
    ) -> ScheduleResult<()> {
        match keyword.name() {
            "DATES" => {
                for (index, record) in keyword.records().iter().enumerate() {
                    date_from_record(record)
                        .and_then(|time| self.time_map.add_time(time))
                        .map_err(|error| error.or_at(keyword.location().with_record(index)))?;
                    *step += 1;
                }
            }
            "TSTEP" => {
                let item = keyword.record(0)?.item("step_list")?;
                for index in 0..item.len() {
                    let days = item.get_si_double(index, self.units)? / SECONDS_PER_DAY;
                    self.time_map.add_days(days)?;
                    *step += 1;
                }
            }
            name => match handlers.get(name) {
                Some(handler) => handler.apply(keyword, self, *step)?,
                None => tracing::trace!(keyword = name, "no schedule handler, skipped"),
            },
        }
        Ok(())
    }

    fn collect_completion_orders(&mut self, keywords: &[&DeckKeyword]) -> ScheduleResult<()> {
        let steps = keyword_steps(keywords)?;
        for (keyword, step) in keywords.iter().zip(steps) {
            if keyword.name() != "COMPORD" {
                continue;
            }
            for record in keyword.records() {
                let pattern = record.item("WELL")?.get_string(0)?;
                let order = record.item("ORDER_TYPE")?.get_string(0)?;
                if let Some(order) = CompletionOrder::parse(order) {
                    self.completion_orders
                        .entry(step)
                        .or_default()
                        .push((pattern.to_string(), order));
                }
            }
        }
        Ok(())
    }

    /// Order given by the last COMPORD record of `step` matching `well`.
    fn completion_order_for(&self, well: &str, step: usize) -> CompletionOrder {
        self.completion_orders
            .get(&step)
            .and_then(|orders| {
                orders.iter().rev().find(|(pattern, _)| {
                    Glob::new(pattern)
                        .map(|glob| glob.compile_matcher().is_match(well))
                        .unwrap_or(pattern == well)
                })
            })
            .map(|(_, order)| *order)
            .unwrap_or_default()
    }

    /// Names matched by `pattern`. A pattern whose only `*` is the trailing
    /// character is a glob over all wells; anything else names one well,
    /// which must exist.
    pub fn wells_matching(&self, pattern: &str) -> ScheduleResult<Vec<String>> {
        let is_glob = pattern.find('*').is_some_and(|star| star == pattern.len() - 1);
        if !is_glob {
            self.well_ref(pattern)?;
            return Ok(vec![pattern.to_string()]);
        }
        let matcher = Glob::new(pattern)
            .map_err(|error| {
                EclError::invalid_input(
                    "SCHEDULE.INVALID_PATTERN",
                    format!("invalid well pattern '{pattern}': {error}"),
                )
            })?
            .compile_matcher();
        Ok(self
            .wells
            .iter()
            .filter(|well| matcher.is_match(well.name()))
            .map(|well| well.name().to_string())
            .collect())
    }

    /// Sets the status of `well` from `step` on. WELL_STATUS_CHANGE is raised
    /// only when the forward-filled status differs.
    pub fn update_well_status(
        &mut self,
        well: &str,
        step: usize,
        status: WellStatus,
    ) -> ScheduleResult<bool> {
        let changed = self.well_mut(well)?.set_status(step, status);
        if changed {
            self.events.add_event(ScheduleEvent::WellStatusChange, step);
        }
        Ok(changed)
    }

    fn add_group(&mut self, name: &str, step: usize) {
        self.group_index.insert(name.to_string(), self.groups.len());
        self.groups.push(Group::new(name, step));
        self.events.add_event(ScheduleEvent::NewGroup, step);
    }

    fn add_well(&mut self, spec: WellSpec, step: usize) {
        tracing::debug!(well = spec.name.as_str(), step, "well defined");
        self.well_index.insert(spec.name.clone(), self.wells.len());
        self.wells.push(Well::new(spec, step));
        self.events.add_event(ScheduleEvent::NewWell, step);
    }

    fn add_well_to_group(&mut self, well: &str, group: &str, step: usize) -> ScheduleResult<()> {
        let previous = self.well_ref(well)?.group_name(step).map(str::to_string);
        if let Some(previous) = previous.filter(|previous| previous != group) {
            self.group_mut(&previous)?.remove_well(well, step);
        }
        self.well_mut(well)?.set_group_name(step, group);
        self.group_mut(group)?.add_well(well, step);
        Ok(())
    }

    fn set_group_tree(&mut self, step: usize, tree: GroupTree) {
        if self.group_tree.update(step, tree) {
            self.events.add_event(ScheduleEvent::GroupChange, step);
        }
    }

    fn well_ref(&self, name: &str) -> ScheduleResult<&Well> {
        self.well(name).ok_or_else(|| {
            EclError::invalid_input("SCHEDULE.UNKNOWN_WELL", format!("well {name} is not defined"))
        })
    }

    fn well_mut(&mut self, name: &str) -> ScheduleResult<&mut Well> {
        match self.well_index.get(name) {
            Some(index) => Ok(&mut self.wells[*index]),
            None => Err(EclError::invalid_input(
                "SCHEDULE.UNKNOWN_WELL",
                format!("well {name} is not defined"),
            )),
        }
    }

    fn group_mut(&mut self, name: &str) -> ScheduleResult<&mut Group> {
        match self.group_index.get(name) {
            Some(index) => Ok(&mut self.groups[*index]),
            None => Err(EclError::invalid_input(
                "SCHEDULE.UNKNOWN_GROUP",
                format!("group {name} is not defined"),
            )),
        }
    }

    pub fn time_map(&self) -> &TimeMap {
        &self.time_map
    }

    pub fn num_timesteps(&self) -> usize {
        self.time_map.num_timesteps()
    }

    pub fn start_time(&self) -> NaiveDateTime {
        self.time_map.start_time()
    }

    pub fn unit_system(&self) -> UnitSystem {
        self.units
    }

    pub fn well(&self, name: &str) -> Option<&Well> {
        self.well_index.get(name).map(|index| &self.wells[*index])
    }

    pub fn has_well(&self, name: &str) -> bool {
        self.well_index.contains_key(name)
    }

    /// All wells in definition order.
    pub fn wells(&self) -> &[Well] {
        &self.wells
    }

    pub fn wells_at(&self, step: usize) -> Vec<&Well> {
        self.wells
            .iter()
            .filter(|well| well.has_been_defined(step))
            .collect()
    }

    pub fn num_wells(&self) -> usize {
        self.wells.len()
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.group_index.get(name).map(|index| &self.groups[*index])
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.group_index.contains_key(name)
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group_tree(&self, step: usize) -> &GroupTree {
        self.group_tree.get(step)
    }

    pub fn events(&self) -> &Events {
        &self.events
    }

    pub fn messages(&self) -> &MessageContainer {
        &self.messages
    }

    /// MULTFLT keywords given at `step`, in input order.
    pub fn modifier_deck(&self, step: usize) -> Option<&Deck> {
        self.modifier_decks.get(&step)
    }

    pub fn oil_vaporization(&self, step: usize) -> Option<OilVaporization> {
        *self.oil_vaporization.get(step)
    }

    pub fn tuning(&self, step: usize) -> &Tuning {
        self.tuning.get(step)
    }

    pub fn restart_schedule(&self, step: usize) -> &RestartSchedule {
        self.restart.get(step)
    }

    /// Whether RPTRST and RPTSCHED ask for a restart file at the end of `step`.
    pub fn write_restart_file(&self, step: usize) -> bool {
        step <= self.time_map.last_step() && self.restart.get(step).writes_at(step, &self.time_map)
    }

    pub fn nosim(&self) -> bool {
        self.nosim
    }

    pub fn max_num_completions(&self, step: usize) -> usize {
        self.wells
            .iter()
            .map(|well| well.completions(step).len())
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::{FIELD, Schedule, ScheduleEvent, WellStatus};
    use crate::common::ParseConfig;
    use crate::deck::DeckParser;
    use crate::domain::EclErrorCategory;
    use crate::schema::SchemaRegistry;

    fn schedule(source: &str) -> Schedule {
        let registry = SchemaRegistry::builtin();
        let config = ParseConfig::default();
        let parsed = DeckParser::new(&registry, &config)
            .parse_str(source)
            .expect("deck should parse");
        Schedule::new(&parsed.deck, &config).expect("schedule should build")
    }

    const BASE: &str = "
RUNSPEC
START
 1 JAN 2000 /
SCHEDULE
WELSPECS
 'OP1' 'G1' 3 4 1* 'OIL' /
 'OP2' 'G1' 5 6 1* 'OIL' /
/
";

    #[test]
    fn field_group_exists_from_the_start() {
        let schedule = schedule("SCHEDULE\n");
        assert!(schedule.has_group(FIELD));
        assert!(schedule.events().has_event(ScheduleEvent::NewGroup, 0));
        assert_eq!(schedule.num_timesteps(), 0);
    }

    #[test]
    fn welspecs_defines_wells_and_groups() {
        let schedule = schedule(BASE);
        let well = schedule.well("OP1").expect("OP1 is defined");
        assert_eq!((well.head_i(), well.head_j()), (2, 3));
        assert_eq!(well.group_name(0), Some("G1"));
        assert_eq!(well.status(0), WellStatus::Shut);
        assert_eq!(schedule.group_tree(0).parent("G1"), Some(FIELD));
        assert!(schedule.events().has_event(ScheduleEvent::NewWell, 0));
        assert!(schedule.events().has_event(ScheduleEvent::GroupChange, 0));
    }

    #[test]
    fn glob_patterns_match_defined_wells() {
        let schedule = schedule(BASE);
        assert_eq!(
            schedule.wells_matching("OP*").expect("pattern is valid"),
            vec!["OP1", "OP2"]
        );
        let error = schedule
            .wells_matching("INJ1")
            .expect_err("INJ1 is not defined");
        assert_eq!(error.placeholder(), "SCHEDULE.UNKNOWN_WELL");
        assert_eq!(error.category(), EclErrorCategory::InvalidInputError);
    }

    #[test]
    fn status_changes_are_raised_once() {
        let mut schedule = schedule(BASE);
        assert!(
            schedule
                .update_well_status("OP1", 0, WellStatus::Open)
                .expect("OP1 exists")
        );
        assert!(
            !schedule
                .update_well_status("OP1", 0, WellStatus::Open)
                .expect("OP1 exists")
        );
        assert_eq!(
            schedule.events().steps_with(ScheduleEvent::WellStatusChange),
            vec![0]
        );
    }

    #[test]
    fn keywords_without_handler_are_skipped() {
        let schedule = schedule(&format!("{BASE}COMPLUMP\n 'OP1' 1* 1* 1 1 1 /\n/\n"));
        assert_eq!(schedule.num_wells(), 2);
    }

    #[test]
    fn tuning_defaults_apply_before_any_tuning_keyword() {
        let schedule = schedule(BASE);
        assert_eq!(schedule.tuning(0).newtmx, 12);
        assert!((schedule.tuning(0).tsinit - 86_400.0).abs() < 1e-9);
        assert!(!schedule.write_restart_file(0));
    }
}
