use super::completion::{Completion, CompletionOrder, CompletionSet};
use super::dynamic_state::DynamicState;
use super::segments::SegmentSet;
use crate::domain::{EclError, ScheduleResult};
use serde::Serialize;

fn unknown(kind: &str, text: &str) -> EclError {
    EclError::invalid_input(
        "SCHEDULE.INVALID_ENUM",
        format!("'{text}' is not a valid {kind}"),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WellStatus {
    Open,
    Stop,
    Shut,
    Auto,
}

impl WellStatus {
    pub fn parse(text: &str) -> ScheduleResult<Self> {
        match text {
            "OPEN" => Ok(Self::Open),
            "STOP" => Ok(Self::Stop),
            "SHUT" => Ok(Self::Shut),
            "AUTO" => Ok(Self::Auto),
            other => Err(unknown("well status", other)),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Stop => "STOP",
            Self::Shut => "SHUT",
            Self::Auto => "AUTO",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Phase {
    Oil,
    Gas,
    Water,
}

impl Phase {
    pub fn parse(text: &str) -> ScheduleResult<Self> {
        match text {
            "OIL" => Ok(Self::Oil),
            "GAS" => Ok(Self::Gas),
            "WATER" | "WAT" => Ok(Self::Water),
            other => Err(unknown("phase", other)),
        }
    }

    /// Unit dimension of a surface rate of this phase.
    pub const fn rate_dimension(self) -> &'static str {
        match self {
            Self::Gas => "GasSurfaceVolume/Time",
            Self::Oil | Self::Water => "LiquidSurfaceVolume/Time",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProducerControl {
    Orat,
    Wrat,
    Grat,
    Lrat,
    Crat,
    Resv,
    Bhp,
    Thp,
    Grup,
}

impl ProducerControl {
    pub fn parse(text: &str) -> ScheduleResult<Self> {
        match text {
            "ORAT" => Ok(Self::Orat),
            "WRAT" => Ok(Self::Wrat),
            "GRAT" => Ok(Self::Grat),
            "LRAT" => Ok(Self::Lrat),
            "CRAT" => Ok(Self::Crat),
            "RESV" => Ok(Self::Resv),
            "BHP" => Ok(Self::Bhp),
            "THP" => Ok(Self::Thp),
            "GRUP" => Ok(Self::Grup),
            other => Err(unknown("producer control mode", other)),
        }
    }

    const fn bit(self) -> u32 {
        1 << self as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InjectorControl {
    Rate,
    Resv,
    Bhp,
    Thp,
    Grup,
}

impl InjectorControl {
    pub fn parse(text: &str) -> ScheduleResult<Self> {
        match text {
            "RATE" => Ok(Self::Rate),
            "RESV" => Ok(Self::Resv),
            "BHP" => Ok(Self::Bhp),
            "THP" => Ok(Self::Thp),
            "GRUP" => Ok(Self::Grup),
            other => Err(unknown("injector control mode", other)),
        }
    }

    const fn bit(self) -> u32 {
        1 << self as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InjectorType {
    #[default]
    Water,
    Gas,
    Oil,
    Multi,
}

impl InjectorType {
    pub fn parse(text: &str) -> ScheduleResult<Self> {
        match text {
            "WATER" | "WAT" => Ok(Self::Water),
            "GAS" => Ok(Self::Gas),
            "OIL" => Ok(Self::Oil),
            "MULTI" => Ok(Self::Multi),
            other => Err(unknown("injector type", other)),
        }
    }

    /// `None` for multi-phase injectors, whose rates are not converted.
    pub const fn rate_dimension(self) -> Option<&'static str> {
        match self {
            Self::Water | Self::Oil => Some("LiquidSurfaceVolume/Time"),
            Self::Gas => Some("GasSurfaceVolume/Time"),
            Self::Multi => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GuideRatePhase {
    Oil,
    Wat,
    Gas,
    Liq,
    Comb,
    Wga,
    Cval,
    Rat,
    Res,
    #[default]
    Undefined,
}

impl GuideRatePhase {
    pub fn parse(text: &str) -> ScheduleResult<Self> {
        match text {
            "OIL" => Ok(Self::Oil),
            "WAT" => Ok(Self::Wat),
            "GAS" => Ok(Self::Gas),
            "LIQ" => Ok(Self::Liq),
            "COMB" => Ok(Self::Comb),
            "WGA" => Ok(Self::Wga),
            "CVAL" => Ok(Self::Cval),
            "RAT" => Ok(Self::Rat),
            "RES" => Ok(Self::Res),
            "UNDEFINED" => Ok(Self::Undefined),
            other => Err(unknown("guide rate phase", other)),
        }
    }
}

/// Production controls and limits, rates and pressures in SI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionProperties {
    pub prediction_mode: bool,
    pub control_mode: Option<ProducerControl>,
    pub oil_rate: f64,
    pub water_rate: f64,
    pub gas_rate: f64,
    pub liquid_rate: f64,
    pub resv_rate: f64,
    pub bhp_limit: f64,
    pub thp_limit: f64,
    pub vfp_table: i32,
    pub alq: f64,
    pub(crate) controls: u32,
}

impl Default for ProductionProperties {
    fn default() -> Self {
        Self {
            prediction_mode: true,
            control_mode: None,
            oil_rate: 0.0,
            water_rate: 0.0,
            gas_rate: 0.0,
            liquid_rate: 0.0,
            resv_rate: 0.0,
            bhp_limit: 0.0,
            thp_limit: 0.0,
            vfp_table: 0,
            alq: 0.0,
            controls: 0,
        }
    }
}

impl ProductionProperties {
    pub fn has_control(&self, control: ProducerControl) -> bool {
        self.controls & control.bit() != 0
    }

    pub fn add_control(&mut self, control: ProducerControl) {
        self.controls |= control.bit();
    }

    pub fn drop_control(&mut self, control: ProducerControl) {
        self.controls &= !control.bit();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InjectionProperties {
    pub injector_type: InjectorType,
    pub prediction_mode: bool,
    pub control_mode: Option<InjectorControl>,
    pub surface_rate: f64,
    pub reservoir_rate: f64,
    pub bhp_limit: f64,
    pub thp_limit: f64,
    pub vfp_table: i32,
    pub(crate) controls: u32,
}

impl Default for InjectionProperties {
    fn default() -> Self {
        Self {
            injector_type: InjectorType::Water,
            prediction_mode: true,
            control_mode: None,
            surface_rate: 0.0,
            reservoir_rate: 0.0,
            bhp_limit: 0.0,
            thp_limit: 0.0,
            vfp_table: 0,
            controls: 0,
        }
    }
}

impl InjectionProperties {
    pub fn has_control(&self, control: InjectorControl) -> bool {
        self.controls & control.bit() != 0
    }

    pub fn add_control(&mut self, control: InjectorControl) {
        self.controls |= control.bit();
    }

    pub fn drop_control(&mut self, control: InjectorControl) {
        self.controls &= !control.bit();
    }

    pub fn toggle_control(&mut self, control: InjectorControl, enabled: bool) {
        if enabled {
            self.add_control(control);
        } else {
            self.drop_control(control);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PolymerProperties {
    pub polymer_concentration: f64,
    pub salt_concentration: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GuideRate {
    pub value: f64,
    pub phase: GuideRatePhase,
    pub scaling_factor: f64,
}

impl Default for GuideRate {
    fn default() -> Self {
        Self {
            value: -1.0,
            phase: GuideRatePhase::Undefined,
            scaling_factor: 1.0,
        }
    }
}

/// Static definition from WELSPECS.
#[derive(Debug, Clone, PartialEq)]
pub struct WellSpec {
    pub name: String,
    /// 0-based.
    pub head_i: i32,
    /// 0-based.
    pub head_j: i32,
    pub ref_depth: Option<f64>,
    pub preferred_phase: Phase,
    pub allow_cross_flow: bool,
    pub completion_order: CompletionOrder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Well {
    spec: WellSpec,
    creation_step: usize,
    status: DynamicState<WellStatus>,
    production: DynamicState<ProductionProperties>,
    injection: DynamicState<InjectionProperties>,
    is_producer: DynamicState<bool>,
    polymer: DynamicState<PolymerProperties>,
    solvent_fraction: DynamicState<f64>,
    completions: DynamicState<CompletionSet>,
    segments: DynamicState<Option<SegmentSet>>,
    group_name: DynamicState<Option<String>>,
    guide_rate: DynamicState<GuideRate>,
    group_control: DynamicState<bool>,
    rft: DynamicState<bool>,
    plt: DynamicState<bool>,
}

impl Well {
    pub fn new(spec: WellSpec, creation_step: usize) -> Self {
        Self {
            spec,
            creation_step,
            status: DynamicState::new(WellStatus::Shut),
            production: DynamicState::new(ProductionProperties::default()),
            injection: DynamicState::new(InjectionProperties::default()),
            is_producer: DynamicState::new(true),
            polymer: DynamicState::new(PolymerProperties::default()),
            solvent_fraction: DynamicState::new(0.0),
            completions: DynamicState::new(CompletionSet::new()),
            segments: DynamicState::new(None),
            group_name: DynamicState::new(None),
            guide_rate: DynamicState::new(GuideRate::default()),
            group_control: DynamicState::new(true),
            rft: DynamicState::new(false),
            plt: DynamicState::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn spec(&self) -> &WellSpec {
        &self.spec
    }

    pub fn head_i(&self) -> i32 {
        self.spec.head_i
    }

    pub fn head_j(&self) -> i32 {
        self.spec.head_j
    }

    pub fn allows_cross_flow(&self) -> bool {
        self.spec.allow_cross_flow
    }

    pub fn creation_step(&self) -> usize {
        self.creation_step
    }

    pub fn has_been_defined(&self, step: usize) -> bool {
        step >= self.creation_step
    }

    pub fn status(&self, step: usize) -> WellStatus {
        *self.status.get(step)
    }

    /// Use `Schedule::update_well_status` so the change is also recorded as
    /// an event.
    pub(crate) fn set_status(&mut self, step: usize, status: WellStatus) -> bool {
        self.status.update(step, status)
    }

    pub fn production_properties(&self, step: usize) -> &ProductionProperties {
        self.production.get(step)
    }

    pub fn set_production_properties(&mut self, step: usize, properties: ProductionProperties) -> bool {
        self.is_producer.update(step, true);
        self.production.update(step, properties)
    }

    pub fn injection_properties(&self, step: usize) -> &InjectionProperties {
        self.injection.get(step)
    }

    pub fn set_injection_properties(&mut self, step: usize, properties: InjectionProperties) -> bool {
        self.is_producer.update(step, false);
        self.injection.update(step, properties)
    }

    pub fn is_producer(&self, step: usize) -> bool {
        *self.is_producer.get(step)
    }

    pub fn is_injector(&self, step: usize) -> bool {
        !self.is_producer(step)
    }

    pub fn polymer_properties(&self, step: usize) -> PolymerProperties {
        *self.polymer.get(step)
    }

    pub fn set_polymer_properties(&mut self, step: usize, properties: PolymerProperties) -> bool {
        self.polymer.update(step, properties)
    }

    pub fn solvent_fraction(&self, step: usize) -> f64 {
        *self.solvent_fraction.get(step)
    }

    pub fn set_solvent_fraction(&mut self, step: usize, fraction: f64) -> bool {
        self.solvent_fraction.update(step, fraction)
    }

    pub fn completions(&self, step: usize) -> &CompletionSet {
        self.completions.get(step)
    }

    pub fn set_completions(&mut self, step: usize, completions: CompletionSet) -> bool {
        self.completions.update(step, completions)
    }

    /// Adds new completions on top of the current set. Cells given as
    /// negative fall back to the well head.
    pub fn add_completions(&mut self, step: usize, new: Vec<Completion>) -> bool {
        let mut set = self.completions(step).clone();
        for mut completion in new {
            if completion.i < 0 {
                completion.i = self.spec.head_i;
            }
            if completion.j < 0 {
                completion.j = self.spec.head_j;
            }
            set.add(completion);
        }
        self.set_completions(step, set)
    }

    /// Segment structure from the last WELSEGS at or before `step`.
    pub fn segment_set(&self, step: usize) -> Option<&SegmentSet> {
        self.segments.get(step).as_ref()
    }

    pub fn set_segment_set(&mut self, step: usize, segments: SegmentSet) -> bool {
        self.segments.update(step, Some(segments))
    }

    pub fn is_multi_segment(&self, step: usize) -> bool {
        self.segment_set(step).is_some()
    }

    pub fn group_name(&self, step: usize) -> Option<&str> {
        self.group_name.get(step).as_deref()
    }

    pub fn set_group_name(&mut self, step: usize, group: &str) -> bool {
        self.group_name.update(step, Some(group.to_string()))
    }

    pub fn guide_rate(&self, step: usize) -> GuideRate {
        *self.guide_rate.get(step)
    }

    pub fn set_guide_rate(&mut self, step: usize, guide_rate: GuideRate) -> bool {
        self.guide_rate.update(step, guide_rate)
    }

    pub fn set_guide_rate_value(&mut self, step: usize, value: f64) -> bool {
        let guide_rate = GuideRate {
            value,
            ..self.guide_rate(step)
        };
        self.set_guide_rate(step, guide_rate)
    }

    pub fn is_available_for_group_control(&self, step: usize) -> bool {
        *self.group_control.get(step)
    }

    pub fn set_available_for_group_control(&mut self, step: usize, available: bool) -> bool {
        self.group_control.update(step, available)
    }

    pub fn rft_active(&self, step: usize) -> bool {
        *self.rft.get(step)
    }

    pub fn set_rft_active(&mut self, step: usize, active: bool) -> bool {
        self.rft.update(step, active)
    }

    pub fn plt_active(&self, step: usize) -> bool {
        *self.plt.get(step)
    }

    pub fn set_plt_active(&mut self, step: usize, active: bool) -> bool {
        self.plt.update(step, active)
    }

    /// Requests RFT output at the first step from `step` on where the well is
    /// open, for that step only.
    pub fn set_rft_when_first_open(&mut self, step: usize, last_step: usize) {
        let first_open = if self.status(step) == WellStatus::Open {
            Some(step)
        } else {
            self.status
                .find_from(step, last_step, |status| *status == WellStatus::Open)
        };
        if let Some(open_step) = first_open {
            self.set_rft_active(open_step, true);
            if open_step < last_step {
                self.set_rft_active(open_step + 1, false);
            }
        }
    }

    /// A well with banned crossflow cannot open without a non-zero rate.
    pub fn can_open(&self, step: usize) -> bool {
        if self.spec.allow_cross_flow {
            return true;
        }
        if self.is_producer(step) {
            let production = self.production_properties(step);
            production.oil_rate + production.water_rate + production.gas_rate != 0.0
        } else {
            self.injection_properties(step).surface_rate != 0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        InjectionProperties, Phase, ProducerControl, ProductionProperties, Well, WellSpec,
        WellStatus,
    };
    use crate::schedule::completion::{Completion, CompletionOrder, CompletionState};

    fn well(allow_cross_flow: bool) -> Well {
        Well::new(
            WellSpec {
                name: "OP1".to_string(),
                head_i: 4,
                head_j: 6,
                ref_depth: None,
                preferred_phase: Phase::Oil,
                allow_cross_flow,
                completion_order: CompletionOrder::Track,
            },
            1,
        )
    }

    #[test]
    fn defaulted_cells_use_the_well_head() {
        let mut well = well(true);
        well.add_completions(2, vec![Completion::new(-1, -1, 0, CompletionState::Open)]);
        let completion = well.completions(2).get(0).cloned().expect("one completion");
        assert_eq!((completion.i, completion.j), (4, 6));
        assert!(well.completions(1).is_empty());
    }

    #[test]
    fn production_and_injection_switch_role() {
        let mut well = well(true);
        assert!(well.is_producer(1));
        well.set_injection_properties(3, InjectionProperties::default());
        assert!(well.is_injector(3));
        assert!(well.is_producer(2));
    }

    #[test]
    fn control_set_tracks_modes() {
        let mut properties = ProductionProperties::default();
        properties.add_control(ProducerControl::Orat);
        properties.add_control(ProducerControl::Bhp);
        properties.drop_control(ProducerControl::Orat);
        assert!(properties.has_control(ProducerControl::Bhp));
        assert!(!properties.has_control(ProducerControl::Orat));
    }

    #[test]
    fn banned_crossflow_needs_rate_to_open() {
        let mut well = well(false);
        assert!(!well.can_open(2));
        let properties = ProductionProperties {
            oil_rate: 10.0,
            ..ProductionProperties::default()
        };
        well.set_production_properties(2, properties);
        assert!(well.can_open(2));
    }

    #[test]
    fn rft_waits_for_first_open_step() {
        let mut well = well(true);
        well.set_status(4, WellStatus::Open);
        well.set_rft_when_first_open(1, 6);
        assert!(!well.rft_active(3));
        assert!(well.rft_active(4));
        assert!(!well.rft_active(5));
    }
}
