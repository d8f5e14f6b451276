//! Keyword handlers applied while walking the SCHEDULE section.
//!
//! Each handler receives the keyword, the schedule under construction and the
//! report step the keyword belongs to. Handlers are looked up by name in a
//! [`HandlerRegistry`]; names without a handler are skipped by the walk.

use super::completion::{
    Completion, CompletionFilter, CompletionOrder, CompletionSet, CompletionState,
};
use super::events::ScheduleEvent;
use super::group::{
    ExceedAction, FIELD, GroupInjectionControl, GroupInjectionTargets, GroupProductionControl,
    GroupProductionTargets,
};
use super::well::{
    GuideRate, GuideRatePhase, InjectorControl, InjectorType, Phase, PolymerProperties,
    ProducerControl, ProductionProperties, WellSpec, WellStatus,
};
use super::restart::RestartSchedule;
use super::segments::{Segment, SegmentInfo, SegmentRange, SegmentSet};
use super::{OilVaporization, Schedule};
use crate::common::config::ParseErrorKind;
use crate::deck::{DeckKeyword, DeckRecord};
use crate::domain::{EclError, ScheduleResult};
use crate::schema::UNSUPPORTED_GEO_MODIFIERS;
use crate::units::UnitSystem;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::OnceLock;

const LIQUID_RATE: &str = "LiquidSurfaceVolume/Time";
const GAS_RATE: &str = "GasSurfaceVolume/Time";
const RESV_RATE: &str = "ReservoirVolume/Time";
const PRESSURE: &str = "Pressure";

pub trait KeywordHandler: Send + Sync {
    fn apply(&self, keyword: &DeckKeyword, schedule: &mut Schedule, step: usize)
    -> ScheduleResult<()>;
}

impl<F> KeywordHandler for F
where
    F: Fn(&DeckKeyword, &mut Schedule, usize) -> ScheduleResult<()> + Send + Sync,
{
    fn apply(
        &self,
        keyword: &DeckKeyword,
        schedule: &mut Schedule,
        step: usize,
    ) -> ScheduleResult<()> {
        self(keyword, schedule, step)
    }
}

#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Box<dyn KeywordHandler>>,
}

impl Debug for HandlerRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("keywords", &self.names())
            .finish()
    }
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handlers for every SCHEDULE keyword this crate understands.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("WELSPECS", handle_welspecs);
        registry.register("COMPORD", handle_compord);
        registry.register("COMPDAT", handle_compdat);
        registry.register("WCONPROD", handle_wconprod);
        registry.register("WCONHIST", handle_wconhist);
        registry.register("WCONINJE", handle_wconinje);
        registry.register("WCONINJH", handle_wconinjh);
        registry.register("WPOLYMER", handle_wpolymer);
        registry.register("WSOLVENT", handle_wsolvent);
        registry.register("WGRUPCON", handle_wgrupcon);
        registry.register("WELOPEN", handle_welopen);
        registry.register("WELTARG", handle_weltarg);
        registry.register("WPIMULT", handle_wpimult);
        registry.register("WELSEGS", handle_welsegs);
        registry.register("COMPSEGS", handle_compsegs);
        registry.register("WRFT", defer_rft);
        registry.register("WRFTPLT", defer_rft);
        registry.register("GRUPTREE", handle_gruptree);
        registry.register("GCONPROD", handle_gconprod);
        registry.register("GCONINJE", handle_gconinje);
        registry.register("GEFAC", handle_gefac);
        registry.register("DRSDT", handle_oil_vaporization);
        registry.register("DRVDT", handle_oil_vaporization);
        registry.register("VAPPARS", handle_oil_vaporization);
        registry.register("TUNING", handle_tuning);
        registry.register("RPTRST", defer_restart);
        registry.register("RPTSCHED", defer_restart);
        registry.register("NOSIM", handle_nosim);
        registry.register("MULTFLT", handle_multflt);
        for name in UNSUPPORTED_GEO_MODIFIERS {
            registry.register(name, handle_unsupported_geo_modifier);
        }
        registry
    }

    /// The builtin registry, built on first use.
    pub fn shared() -> &'static Self {
        static SHARED: OnceLock<HandlerRegistry> = OnceLock::new();
        SHARED.get_or_init(Self::builtin)
    }

    /// Returns the handler previously registered under `name`.
    pub fn register(
        &mut self,
        name: &str,
        handler: impl KeywordHandler + 'static,
    ) -> Option<Box<dyn KeywordHandler>> {
        self.handlers.insert(name.to_string(), Box::new(handler))
    }

    pub fn get(&self, name: &str) -> Option<&dyn KeywordHandler> {
        self.handlers.get(name).map(Box::as_ref)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn each_record(
    keyword: &DeckKeyword,
    mut apply: impl FnMut(&DeckRecord) -> ScheduleResult<()>,
) -> ScheduleResult<()> {
    for (index, record) in keyword.records().iter().enumerate() {
        apply(record).map_err(|error| error.or_at(keyword.location().with_record(index)))?;
    }
    Ok(())
}

fn text<'a>(record: &'a DeckRecord, name: &str) -> ScheduleResult<&'a str> {
    record.item(name)?.get_string(0)
}

fn defaulted(record: &DeckRecord, name: &str) -> ScheduleResult<bool> {
    Ok(record.item(name)?.default_applied(0))
}

fn si(record: &DeckRecord, name: &str, units: UnitSystem) -> ScheduleResult<f64> {
    record.item(name)?.get_si_double(0, units)
}

fn optional_si(record: &DeckRecord, name: &str, units: UnitSystem) -> ScheduleResult<Option<f64>> {
    let item = record.item(name)?;
    if item.has_value(0) {
        item.get_si_double(0, units).map(Some)
    } else {
        Ok(None)
    }
}

/// 1-based index given explicitly and greater than zero, as 0-based.
fn positive_index(record: &DeckRecord, name: &str) -> ScheduleResult<Option<i32>> {
    let item = record.item(name)?;
    if item.default_applied(0) || !item.has_value(0) {
        return Ok(None);
    }
    let value = item.get_int(0)?;
    Ok((value > 0).then_some(value - 1))
}

fn position(index: Option<i32>) -> Option<usize> {
    index.and_then(|value| usize::try_from(value).ok())
}

fn yes_no(record: &DeckRecord, name: &str) -> ScheduleResult<bool> {
    match text(record, name)? {
        "YES" => Ok(true),
        "NO" => Ok(false),
        other => Err(EclError::invalid_input(
            "SCHEDULE.INVALID_YES_NO",
            format!("expected YES or NO for {name}, found '{other}'"),
        )),
    }
}

fn completion_filter(
    record: &DeckRecord,
    first: &str,
    last: &str,
) -> ScheduleResult<CompletionFilter> {
    Ok(CompletionFilter {
        i: positive_index(record, "I")?,
        j: positive_index(record, "J")?,
        k: positive_index(record, "K")?,
        first: position(positive_index(record, first)?),
        last: position(positive_index(record, last)?),
    })
}

fn handle_welspecs(keyword: &DeckKeyword, schedule: &mut Schedule, step: usize) -> ScheduleResult<()> {
    each_record(keyword, |record| {
        let well_name = text(record, "WELL")?;
        let group_name = text(record, "GROUP")?;

        if !schedule.has_group(group_name) {
            schedule.add_group(group_name, step);
        }

        let head_i = record.item("HEAD_I")?.get_int(0)? - 1;
        let head_j = record.item("HEAD_J")?.get_int(0)? - 1;
        match schedule.well(well_name) {
            Some(existing) => {
                if (existing.head_i(), existing.head_j()) != (head_i, head_j) {
                    return Err(EclError::invalid_input(
                        "SCHEDULE.WELL_HEAD_CHANGED",
                        format!(
                            "well {well_name} was specified with head ({}, {}) and cannot move to ({}, {})",
                            existing.head_i() + 1,
                            existing.head_j() + 1,
                            head_i + 1,
                            head_j + 1
                        ),
                    ));
                }
            }
            None => {
                let spec = WellSpec {
                    name: well_name.to_string(),
                    head_i,
                    head_j,
                    ref_depth: optional_si(record, "REF_DEPTH", schedule.units)?,
                    preferred_phase: Phase::parse(text(record, "PHASE")?)?,
                    allow_cross_flow: text(record, "CROSSFLOW")? != "NO",
                    completion_order: schedule.completion_order_for(well_name, step),
                };
                schedule.add_well(spec, step);
            }
        }

        schedule.add_well_to_group(well_name, group_name, step)?;

        if !schedule.group_tree(step).has_node(group_name) {
            let mut tree = schedule.group_tree(step).clone();
            tree.update(group_name, FIELD);
            schedule.set_group_tree(step, tree);
        }
        Ok(())
    })
}

fn handle_compord(keyword: &DeckKeyword, schedule: &mut Schedule, _step: usize) -> ScheduleResult<()> {
    each_record(keyword, |record| {
        let order = text(record, "ORDER_TYPE")?;
        match CompletionOrder::parse(order) {
            Some(CompletionOrder::Track | CompletionOrder::Input) => Ok(()),
            _ => schedule.config.handle(
                ParseErrorKind::UnsupportedCompordType,
                format!("COMPORD order type '{order}' is not supported"),
                &mut schedule.messages,
            ),
        }
    })
}

fn handle_compdat(keyword: &DeckKeyword, schedule: &mut Schedule, step: usize) -> ScheduleResult<()> {
    let units = schedule.units;
    let mut per_well: Vec<(String, Vec<Completion>)> = Vec::new();
    each_record(keyword, |record| {
        let well_name = text(record, "WELL")?;
        if !schedule.has_well(well_name) {
            return Err(unknown_well(well_name));
        }
        let i = positive_index(record, "I")?.unwrap_or(-1);
        let j = positive_index(record, "J")?.unwrap_or(-1);
        let k1 = record.item("K1")?.get_int(0)?;
        let k2 = record.item("K2")?.get_int(0)?;
        if k1 < 1 || k2 < k1 {
            return Err(EclError::invalid_input(
                "SCHEDULE.INVALID_COMPLETION_RANGE",
                format!("layers {k1}..{k2} of well {well_name} are not a valid range"),
            ));
        }
        let state = CompletionState::parse(text(record, "STATE")?)?;
        let template = Completion {
            sat_table: record.item("SAT_TABLE")?.get_int(0)?,
            connection_factor: optional_si(record, "CONNECTION_TRANSMISSIBILITY_FACTOR", units)?,
            diameter: optional_si(record, "DIAMETER", units)?,
            skin: record.item("SKIN")?.get_double(0)?,
            direction: text(record, "DIR")?.to_string(),
            ..Completion::new(i, j, 0, state)
        };

        let position = match per_well.iter().position(|(name, _)| name == well_name) {
            Some(position) => position,
            None => {
                per_well.push((well_name.to_string(), Vec::new()));
                per_well.len() - 1
            }
        };
        per_well[position].1.extend((k1..=k2).map(|k| Completion {
            k: k - 1,
            ..template.clone()
        }));
        Ok(())
    })?;

    for (well_name, completions) in per_well {
        schedule.well_mut(&well_name)?.add_completions(step, completions);
        schedule.events.add_event(ScheduleEvent::CompletionChange, step);
    }
    Ok(())
}

fn handle_wconprod(keyword: &DeckKeyword, schedule: &mut Schedule, step: usize) -> ScheduleResult<()> {
    each_record(keyword, |record| apply_producer(record, schedule, step, false))
}

fn handle_wconhist(keyword: &DeckKeyword, schedule: &mut Schedule, step: usize) -> ScheduleResult<()> {
    each_record(keyword, |record| apply_producer(record, schedule, step, true))
}

fn prediction_properties(
    record: &DeckRecord,
    units: UnitSystem,
    group_control: bool,
) -> ScheduleResult<ProductionProperties> {
    let mut properties = ProductionProperties {
        prediction_mode: true,
        oil_rate: si(record, "ORAT", units)?,
        water_rate: si(record, "WRAT", units)?,
        gas_rate: si(record, "GRAT", units)?,
        liquid_rate: si(record, "LRAT", units)?,
        resv_rate: si(record, "RESV", units)?,
        bhp_limit: si(record, "BHP", units)?,
        thp_limit: si(record, "THP", units)?,
        vfp_table: record.item("VFP_TABLE")?.get_int(0)?,
        alq: record.item("ALQ")?.get_double(0)?,
        ..ProductionProperties::default()
    };
    for (item, control) in [
        ("ORAT", ProducerControl::Orat),
        ("WRAT", ProducerControl::Wrat),
        ("GRAT", ProducerControl::Grat),
        ("LRAT", ProducerControl::Lrat),
        ("RESV", ProducerControl::Resv),
        ("THP", ProducerControl::Thp),
    ] {
        if !defaulted(record, item)? {
            properties.add_control(control);
        }
    }
    properties.add_control(ProducerControl::Bhp);
    if group_control {
        properties.add_control(ProducerControl::Grup);
    }
    Ok(properties)
}

fn history_properties(
    record: &DeckRecord,
    units: UnitSystem,
    previous: &ProductionProperties,
) -> ScheduleResult<ProductionProperties> {
    let mut properties = ProductionProperties {
        prediction_mode: false,
        oil_rate: si(record, "ORAT", units)?,
        water_rate: si(record, "WRAT", units)?,
        gas_rate: si(record, "GRAT", units)?,
        thp_limit: si(record, "THP", units)?,
        vfp_table: record.item("VFP_TABLE")?.get_int(0)?,
        alq: record.item("LIFT")?.get_double(0)?,
        bhp_limit: previous.bhp_limit,
        ..ProductionProperties::default()
    };
    for control in [
        ProducerControl::Orat,
        ProducerControl::Wrat,
        ProducerControl::Grat,
        ProducerControl::Lrat,
        ProducerControl::Resv,
        ProducerControl::Grup,
    ] {
        properties.add_control(control);
    }
    if previous.has_control(ProducerControl::Bhp) {
        properties.add_control(ProducerControl::Bhp);
    }
    Ok(properties)
}

fn apply_producer(
    record: &DeckRecord,
    schedule: &mut Schedule,
    step: usize,
    history: bool,
) -> ScheduleResult<()> {
    let status = WellStatus::parse(text(record, "STATUS")?)?;
    let units = schedule.units;

    for well_name in schedule.wells_matching(text(record, "WELL")?)? {
        let well = schedule.well_ref(&well_name)?;
        let mut properties = if history {
            history_properties(record, units, well.production_properties(step))?
        } else {
            prediction_properties(record, units, well.is_available_for_group_control(step))?
        };

        if status != WellStatus::Shut {
            let cmode = text(record, "CMODE")?;
            let control = ProducerControl::parse(cmode)?;
            if !properties.has_control(control) {
                return Err(invalid_control(cmode, &well_name));
            }
            properties.control_mode = Some(control);
        }

        schedule.update_well_status(&well_name, step, status)?;
        let total_rate = properties.oil_rate + properties.water_rate + properties.gas_rate;
        let well = schedule.well_mut(&well_name)?;
        let cross_flow = well.allows_cross_flow();
        if well.set_production_properties(step, properties) {
            schedule.events.add_event(ScheduleEvent::ProductionUpdate, step);
        }

        if history && !cross_flow && total_rate == 0.0 {
            schedule.messages.info(
                "SCHEDULE.AUTO_SHUT",
                format!("well {well_name} has crossflow banned and zero rate, shut at step {step}"),
            );
            schedule.update_well_status(&well_name, step, WellStatus::Shut)?;
        }
    }
    Ok(())
}

fn invalid_control(cmode: &str, well: &str) -> EclError {
    EclError::invalid_input(
        "SCHEDULE.INVALID_CONTROL_MODE",
        format!("Tried to set invalid control: {cmode} for well: {well}"),
    )
}

fn unknown_well(name: &str) -> EclError {
    EclError::invalid_input("SCHEDULE.UNKNOWN_WELL", format!("well {name} is not defined"))
}

fn injection_rate(injector_type: InjectorType, value: f64, units: UnitSystem) -> f64 {
    match injector_type.rate_dimension() {
        Some(dimension) => units.to_si(dimension, value),
        None => value,
    }
}

fn auto_shut_injector(schedule: &mut Schedule, well_name: &str, step: usize) -> ScheduleResult<()> {
    let well = schedule.well_ref(well_name)?;
    if well.allows_cross_flow() || well.injection_properties(step).surface_rate != 0.0 {
        return Ok(());
    }
    schedule.messages.info(
        "SCHEDULE.AUTO_SHUT",
        format!("injector {well_name} has crossflow banned and zero rate, shut at step {step}"),
    );
    schedule.update_well_status(well_name, step, WellStatus::Shut)?;
    Ok(())
}

fn handle_wconinje(keyword: &DeckKeyword, schedule: &mut Schedule, step: usize) -> ScheduleResult<()> {
    let units = schedule.units;
    each_record(keyword, |record| {
        let status = WellStatus::parse(text(record, "STATUS")?)?;
        let injector_type = InjectorType::parse(text(record, "TYPE")?)?;
        let cmode = text(record, "CMODE")?;
        let control = InjectorControl::parse(cmode)?;

        for well_name in schedule.wells_matching(text(record, "WELL")?)? {
            schedule.update_well_status(&well_name, step, status)?;
            let well = schedule.well_ref(&well_name)?;
            let mut properties = well.injection_properties(step).clone();
            properties.injector_type = injector_type;
            properties.prediction_mode = true;

            let rate_given = !defaulted(record, "RATE")?;
            if rate_given {
                let rate = record.item("RATE")?.get_double(0)?;
                properties.surface_rate = injection_rate(injector_type, rate, units);
            }
            properties.toggle_control(InjectorControl::Rate, rate_given);

            let resv_given = !defaulted(record, "RESV")?;
            if resv_given {
                properties.reservoir_rate = si(record, "RESV", units)?;
            }
            properties.toggle_control(InjectorControl::Resv, resv_given);

            let thp_given = !defaulted(record, "THP")?;
            if thp_given {
                properties.thp_limit = si(record, "THP", units)?;
                properties.vfp_table = record.item("VFP_TABLE")?.get_int(0)?;
            }
            properties.toggle_control(InjectorControl::Thp, thp_given);

            properties.bhp_limit = si(record, "BHP", units)?;
            properties.toggle_control(InjectorControl::Bhp, !defaulted(record, "BHP")?);
            properties.toggle_control(
                InjectorControl::Grup,
                well.is_available_for_group_control(step),
            );

            if !properties.has_control(control) {
                return Err(invalid_control(cmode, &well_name));
            }
            properties.control_mode = Some(control);

            if schedule
                .well_mut(&well_name)?
                .set_injection_properties(step, properties)
            {
                schedule.events.add_event(ScheduleEvent::InjectionUpdate, step);
            }
            auto_shut_injector(schedule, &well_name, step)?;
        }
        Ok(())
    })
}

fn handle_wconinjh(keyword: &DeckKeyword, schedule: &mut Schedule, step: usize) -> ScheduleResult<()> {
    let units = schedule.units;
    each_record(keyword, |record| {
        let well_name = text(record, "WELL")?;
        let status = WellStatus::parse(text(record, "STATUS")?)?;
        let injector_type = InjectorType::parse(text(record, "TYPE")?)?;
        schedule.update_well_status(well_name, step, status)?;

        let mut properties = schedule.well_ref(well_name)?.injection_properties(step).clone();
        properties.injector_type = injector_type;
        properties.prediction_mode = false;
        if !defaulted(record, "RATE")? {
            let rate = record.item("RATE")?.get_double(0)?;
            properties.surface_rate = injection_rate(injector_type, rate, units);
            let control = InjectorControl::parse(text(record, "CMODE")?)?;
            properties.add_control(control);
            properties.control_mode = Some(control);
        }

        if schedule
            .well_mut(well_name)?
            .set_injection_properties(step, properties)
        {
            schedule.events.add_event(ScheduleEvent::InjectionUpdate, step);
        }
        auto_shut_injector(schedule, well_name, step)
    })
}

fn handle_wpolymer(keyword: &DeckKeyword, schedule: &mut Schedule, step: usize) -> ScheduleResult<()> {
    each_record(keyword, |record| {
        for item in ["GROUP_POLYMER_CONCENTRATION", "GROUP_SALT_CONCENTRATION"] {
            if !defaulted(record, item)? {
                return Err(EclError::invalid_input(
                    "SCHEDULE.UNSUPPORTED_GROUP_CONCENTRATION",
                    format!("{item} is not supported in WPOLYMER"),
                ));
            }
        }
        let properties = PolymerProperties {
            polymer_concentration: record.item("POLYMER_CONCENTRATION")?.get_double(0)?,
            salt_concentration: record.item("SALT_CONCENTRATION")?.get_double(0)?,
        };
        for well_name in schedule.wells_matching(text(record, "WELL")?)? {
            schedule
                .well_mut(&well_name)?
                .set_polymer_properties(step, properties);
        }
        Ok(())
    })
}

fn handle_wsolvent(keyword: &DeckKeyword, schedule: &mut Schedule, step: usize) -> ScheduleResult<()> {
    each_record(keyword, |record| {
        let fraction = record.item("SOLVENT_FRACTION")?.get_double(0)?;
        for well_name in schedule.wells_matching(text(record, "WELL")?)? {
            let well = schedule.well_mut(&well_name)?;
            let gas_injector = well.is_injector(step)
                && well.injection_properties(step).injector_type == InjectorType::Gas;
            if !gas_injector {
                return Err(EclError::invalid_input(
                    "SCHEDULE.INVALID_SOLVENT_WELL",
                    format!("WSOLVENT applies to gas injectors only, {well_name} is not one"),
                ));
            }
            well.set_solvent_fraction(step, fraction);
        }
        Ok(())
    })
}

fn handle_wgrupcon(keyword: &DeckKeyword, schedule: &mut Schedule, step: usize) -> ScheduleResult<()> {
    each_record(keyword, |record| {
        let available = yes_no(record, "GROUP_CONTROLLED")?;
        let phase_item = record.item("PHASE")?;
        let phase = if phase_item.default_applied(0) || !phase_item.has_value(0) {
            GuideRatePhase::Undefined
        } else {
            GuideRatePhase::parse(phase_item.get_string(0)?)?
        };
        let guide_rate = GuideRate {
            value: record.item("GUIDE_RATE")?.get_double(0)?,
            phase,
            scaling_factor: record.item("SCALING_FACTOR")?.get_double(0)?,
        };
        for well_name in schedule.wells_matching(text(record, "WELL")?)? {
            let well = schedule.well_mut(&well_name)?;
            well.set_available_for_group_control(step, available);
            well.set_guide_rate(step, guide_rate);
        }
        Ok(())
    })
}

fn handle_welopen(keyword: &DeckKeyword, schedule: &mut Schedule, step: usize) -> ScheduleResult<()> {
    each_record(keyword, |record| {
        let status = text(record, "STATUS")?;
        let mut has_completion_data = false;
        for item in ["I", "J", "K", "C1", "C2"] {
            has_completion_data |= !defaulted(record, item)?;
        }

        if has_completion_data {
            let filter = completion_filter(record, "C1", "C2")?;
            if schedule.has_complump && (filter.first.is_some() || filter.last.is_some()) {
                return Err(EclError::invalid_input(
                    "SCHEDULE.INVALID_KEYWORD_COMBINATION",
                    "WELOPEN cannot select completions by C1/C2 when COMPLUMP is used",
                ));
            }
            let state = CompletionState::parse(status)?;
            for well_name in schedule.wells_matching(text(record, "WELL")?)? {
                let well = schedule.well_mut(&well_name)?;
                let updated = filter.apply(well.completions(step), |completion| {
                    completion.state = state;
                });
                let all_shut = updated.all_shut();
                well.set_completions(step, updated);
                schedule.events.add_event(ScheduleEvent::CompletionChange, step);
                if all_shut {
                    schedule.update_well_status(&well_name, step, WellStatus::Shut)?;
                }
            }
            return Ok(());
        }

        let status = WellStatus::parse(status)?;
        for well_name in schedule.wells_matching(text(record, "WELL")?)? {
            if status == WellStatus::Open && !schedule.well_ref(&well_name)?.can_open(step) {
                schedule.messages.info(
                    "SCHEDULE.CANNOT_OPEN",
                    format!("well {well_name} has crossflow banned and zero rate, not opened at step {step}"),
                );
                continue;
            }
            schedule.update_well_status(&well_name, step, status)?;
        }
        Ok(())
    })
}

fn invalid_weltarg(mode: &str, well: &str) -> EclError {
    EclError::invalid_input(
        "SCHEDULE.INVALID_WELTARG_MODE",
        format!("WELTARG mode {mode} cannot be applied to well {well}"),
    )
}

fn handle_weltarg(keyword: &DeckKeyword, schedule: &mut Schedule, step: usize) -> ScheduleResult<()> {
    let units = schedule.units;
    each_record(keyword, |record| {
        let mode = text(record, "CMODE")?;
        let value = record.item("NEW_VALUE")?.get_double(0)?;
        let liquid = units.to_si(LIQUID_RATE, value);

        for well_name in schedule.wells_matching(text(record, "WELL")?)? {
            let well = schedule.well_mut(&well_name)?;
            if mode == "GUID" {
                well.set_guide_rate_value(step, value);
                continue;
            }

            if well.is_producer(step) {
                let mut properties = well.production_properties(step).clone();
                match mode {
                    "ORAT" => properties.oil_rate = liquid,
                    "WRAT" => properties.water_rate = liquid,
                    "LRAT" => properties.liquid_rate = liquid,
                    "RESV" => properties.resv_rate = liquid,
                    "GRAT" => properties.gas_rate = units.to_si(GAS_RATE, value),
                    "BHP" => {
                        properties.bhp_limit = units.to_si(PRESSURE, value);
                        if !properties.prediction_mode {
                            properties.add_control(ProducerControl::Bhp);
                        }
                    }
                    "THP" => properties.thp_limit = units.to_si(PRESSURE, value),
                    "VFP" => properties.vfp_table = value as i32,
                    _ => return Err(invalid_weltarg(mode, &well_name)),
                }
                if well.set_production_properties(step, properties) {
                    schedule.events.add_event(ScheduleEvent::ProductionUpdate, step);
                }
            } else {
                let mut properties = well.injection_properties(step).clone();
                let injector_type = properties.injector_type;
                match (mode, injector_type) {
                    ("BHP", _) => {
                        properties.bhp_limit = units.to_si(PRESSURE, value);
                        if !properties.prediction_mode {
                            properties.add_control(InjectorControl::Bhp);
                        }
                    }
                    ("ORAT", InjectorType::Oil) | ("WRAT", InjectorType::Water) => {
                        properties.surface_rate = liquid;
                    }
                    ("GRAT", InjectorType::Gas) => {
                        properties.surface_rate = units.to_si(GAS_RATE, value);
                    }
                    ("THP", _) => properties.thp_limit = units.to_si(PRESSURE, value),
                    ("VFP", _) => properties.vfp_table = value as i32,
                    ("RESV", _) => properties.reservoir_rate = units.to_si(RESV_RATE, value),
                    _ => return Err(invalid_weltarg(mode, &well_name)),
                }
                if well.set_injection_properties(step, properties) {
                    schedule.events.add_event(ScheduleEvent::InjectionUpdate, step);
                }
            }
        }
        Ok(())
    })
}

/// Scales the productivity of the selected completions. Only the factor
/// changes, so no COMPLETION_CHANGE event is raised.
fn handle_wpimult(keyword: &DeckKeyword, schedule: &mut Schedule, step: usize) -> ScheduleResult<()> {
    each_record(keyword, |record| {
        let factor = record.item("WELLPI")?.get_double(0)?;
        let filter = completion_filter(record, "FIRST", "LAST")?;
        for well_name in schedule.wells_matching(text(record, "WELL")?)? {
            let well = schedule.well_mut(&well_name)?;
            let updated = filter.apply(well.completions(step), |completion| {
                completion.well_pi *= factor;
            });
            well.set_completions(step, updated);
        }
        Ok(())
    })
}

fn segment_range(record: &DeckRecord, units: UnitSystem) -> ScheduleResult<SegmentRange> {
    Ok(SegmentRange {
        first: record.item("SEGMENT1")?.get_int(0)?,
        last: record.item("SEGMENT2")?.get_int(0)?,
        branch: record.item("BRANCH")?.get_int(0)?,
        outlet: record.item("JOIN_SEGMENT")?.get_int(0)?,
        length: si(record, "SEGMENT_LENGTH", units)?,
        depth: si(record, "DEPTH_CHANGE", units)?,
        diameter: optional_si(record, "DIAMETER", units)?,
        roughness: optional_si(record, "ROUGHNESS", units)?,
        area: optional_si(record, "AREA", units)?,
        volume: optional_si(record, "VOLUME", units)?,
    })
}

fn handle_welsegs(keyword: &DeckKeyword, schedule: &mut Schedule, step: usize) -> ScheduleResult<()> {
    let units = schedule.units;
    let header = keyword.record(0)?;
    let well_name = text(header, "WELL")?;
    if !schedule.has_well(well_name) {
        return Err(unknown_well(well_name));
    }
    let top = Segment {
        number: 1,
        branch: 1,
        outlet: 0,
        total_length: si(header, "LENGTH", units)?,
        depth: si(header, "DEPTH", units)?,
        diameter: None,
        roughness: None,
        area: None,
        volume: si(header, "WELLBORE_VOLUME", units)?,
    };
    let mut segments = SegmentSet::new(
        well_name,
        SegmentInfo::parse(text(header, "INFO_TYPE")?)?,
        text(header, "PRESSURE_COMPONENTS")?,
        text(header, "FLOW_MODEL")?,
        top,
    );
    for (index, record) in keyword.records().iter().enumerate().skip(1) {
        segment_range(record, units)
            .and_then(|range| segments.add_range(&range))
            .map_err(|error| error.or_at(keyword.location().with_record(index)))?;
    }
    schedule
        .well_mut(well_name)?
        .set_segment_set(step, segments);
    Ok(())
}

fn invalid_compsegs(message: String) -> EclError {
    EclError::invalid_input("SCHEDULE.INVALID_COMPSEGS", message)
}

/// Points the completion in the record's cell at its segment, either the
/// one named by SEGMENT_NUMBER or the one on BRANCH holding the middle of
/// the perforated interval.
fn assign_segment(
    record: &DeckRecord,
    segments: &SegmentSet,
    completions: &mut CompletionSet,
    units: UnitSystem,
) -> ScheduleResult<()> {
    let well_name = segments.well();
    if record.item("END_IJK")?.has_value(0) {
        return Err(EclError::unsupported(
            "SCHEDULE.UNSUPPORTED_COMPSEGS_RANGE",
            format!("COMPSEGS cell ranges are not supported, well {well_name}"),
        ));
    }
    let i = record.item("I")?.get_int(0)?;
    let j = record.item("J")?.get_int(0)?;
    let k = record.item("K")?.get_int(0)?;

    let number = record.item("SEGMENT_NUMBER")?;
    let candidate = if number.has_value(0) && !number.default_applied(0) {
        segments.get(number.get_int(0)?)
    } else {
        let start = si(record, "DISTANCE_START", units)?;
        let end = si(record, "DISTANCE_END", units)?;
        let branch = record.item("BRANCH")?.get_int(0)?;
        segments.segment_at_distance(branch, (start + end) / 2.0)
    };
    let segment = candidate.ok_or_else(|| {
        invalid_compsegs(format!(
            "no segment of well {well_name} matches cell ({i}, {j}, {k})"
        ))
    })?;

    let center_depth = si(record, "CENTER_DEPTH", units)?;
    if center_depth < 0.0 {
        return Err(EclError::unsupported(
            "SCHEDULE.UNSUPPORTED_CENTER_DEPTH",
            format!("negative CENTER_DEPTH for cell ({i}, {j}, {k}) of well {well_name} is not supported"),
        ));
    }
    let completion = completions.find_mut(i - 1, j - 1, k - 1).ok_or_else(|| {
        invalid_compsegs(format!(
            "well {well_name} has no completion in cell ({i}, {j}, {k})"
        ))
    })?;
    completion.segment_number = Some(segment.number);
    completion.center_depth = Some(if center_depth > 0.0 {
        center_depth
    } else {
        segment.depth
    });
    Ok(())
}

fn handle_compsegs(keyword: &DeckKeyword, schedule: &mut Schedule, step: usize) -> ScheduleResult<()> {
    let units = schedule.units;
    let well_name = text(keyword.record(0)?, "WELL")?;
    let well = schedule.well_ref(well_name)?;
    let Some(segments) = well.segment_set(step) else {
        return Err(invalid_compsegs(format!(
            "well {well_name} has no WELSEGS structure at step {step}"
        )));
    };
    let mut completions = well.completions(step).clone();
    for (index, record) in keyword.records().iter().enumerate().skip(1) {
        assign_segment(record, segments, &mut completions, units)
            .map_err(|error| error.or_at(keyword.location().with_record(index)))?;
    }
    schedule
        .well_mut(well_name)?
        .set_completions(step, completions);
    schedule.events.add_event(ScheduleEvent::CompletionChange, step);
    Ok(())
}

fn handle_gruptree(keyword: &DeckKeyword, schedule: &mut Schedule, step: usize) -> ScheduleResult<()> {
    each_record(keyword, |record| {
        let child = text(record, "CHILD_GROUP")?;
        let parent = text(record, "PARENT_GROUP")?;
        for name in [child, parent] {
            if !schedule.has_group(name) {
                schedule.add_group(name, step);
            }
        }
        let mut tree = schedule.group_tree(step).clone();
        if tree.update(child, parent) {
            schedule.set_group_tree(step, tree);
        }
        Ok(())
    })
}

fn handle_gconprod(keyword: &DeckKeyword, schedule: &mut Schedule, step: usize) -> ScheduleResult<()> {
    let units = schedule.units;
    each_record(keyword, |record| {
        let targets = GroupProductionTargets {
            control: GroupProductionControl::parse(text(record, "CONTROL_MODE")?)?,
            oil: si(record, "OIL_TARGET", units)?,
            water: si(record, "WATER_TARGET", units)?,
            gas: si(record, "GAS_TARGET", units)?,
            liquid: si(record, "LIQUID_TARGET", units)?,
            reservoir: si(record, "RESERVOIR_FLUID_TARGET", units)?,
            exceed_action: ExceedAction::parse(text(record, "EXCEED_PROC")?)?,
        };
        schedule
            .group_mut(text(record, "GROUP")?)?
            .set_production_targets(step, targets);
        Ok(())
    })
}

fn handle_gconinje(keyword: &DeckKeyword, schedule: &mut Schedule, step: usize) -> ScheduleResult<()> {
    let units = schedule.units;
    each_record(keyword, |record| {
        let phase = Phase::parse(text(record, "PHASE")?)?;
        let surface = record.item("SURFACE_TARGET")?.get_double(0)?;
        let targets = GroupInjectionTargets {
            phase,
            control: GroupInjectionControl::parse(text(record, "CONTROL_MODE")?)?,
            surface_max_rate: units.to_si(phase.rate_dimension(), surface),
            reservoir_max_rate: si(record, "RESV_TARGET", units)?,
            reinjection_fraction: record.item("REINJ_TARGET")?.get_double(0)?,
            voidage_fraction: record.item("VOIDAGE_TARGET")?.get_double(0)?,
        };
        schedule
            .group_mut(text(record, "GROUP")?)?
            .set_injection_targets(step, targets);
        Ok(())
    })
}

fn handle_gefac(keyword: &DeckKeyword, schedule: &mut Schedule, step: usize) -> ScheduleResult<()> {
    each_record(keyword, |record| {
        let factor = record.item("EFFICIENCY_FACTOR")?.get_double(0)?;
        let transfer = text(record, "TRANSFER_EXT_NET")? == "YES";
        schedule
            .group_mut(text(record, "GROUP")?)?
            .set_efficiency(step, factor, transfer);
        Ok(())
    })
}

fn handle_oil_vaporization(
    keyword: &DeckKeyword,
    schedule: &mut Schedule,
    step: usize,
) -> ScheduleResult<()> {
    let record = keyword.record(0)?;
    let value = |name: &str| -> ScheduleResult<f64> { record.item(name)?.get_double(0) };
    let properties = match keyword.name() {
        "DRSDT" => OilVaporization::Drsdt {
            max_rate: value("DRSDT_MAX")?,
            all_cells: text(record, "OPTION")? == "ALL",
        },
        "DRVDT" => OilVaporization::Drvdt {
            max_rate: value("DRVDT_MAX")?,
        },
        _ => OilVaporization::Vappars {
            vap1: value("OIL_VAP_PROPENSITY")?,
            vap2: value("OIL_DENSITY_PROPENSITY")?,
        },
    };
    schedule.oil_vaporization.update(step, Some(properties));
    Ok(())
}

fn handle_tuning(keyword: &DeckKeyword, schedule: &mut Schedule, step: usize) -> ScheduleResult<()> {
    let records = [keyword.record(0)?, keyword.record(1)?, keyword.record(2)?];
    let mut tuning = schedule.tuning(step).clone();
    tuning.apply_records(records, schedule.units)?;
    schedule.tuning.update(step, tuning);
    schedule.events.add_event(ScheduleEvent::TuningChange, step);
    Ok(())
}

fn defer_restart(keyword: &DeckKeyword, schedule: &mut Schedule, step: usize) -> ScheduleResult<()> {
    schedule.deferred_restart.push((keyword.clone(), step));
    Ok(())
}

/// Applies an RPTRST or RPTSCHED keyword given at `step`. The setting takes
/// effect from the next report step, so it is dropped at the last one.
pub(super) fn apply_restart(
    keyword: &DeckKeyword,
    schedule: &mut Schedule,
    step: usize,
) -> ScheduleResult<()> {
    let effective = step + 1;
    if effective > schedule.time_map.last_step() {
        tracing::trace!(keyword = keyword.name(), step, "restart setting after the last report step");
        return Ok(());
    }
    let item = keyword.record(0)?.item("MNEMONIC_LIST")?;
    let tokens = (0..item.len())
        .map(|index| item.get_string(index))
        .collect::<ScheduleResult<Vec<&str>>>()?;
    let updated = match keyword.name() {
        "RPTRST" => RestartSchedule::from_rptrst(&tokens, effective)?,
        _ => schedule.restart.get(effective).with_rptsched(&tokens)?,
    };
    if let Some(updated) = updated {
        schedule.restart.update(effective, updated);
    }
    Ok(())
}

fn handle_nosim(_keyword: &DeckKeyword, schedule: &mut Schedule, _step: usize) -> ScheduleResult<()> {
    schedule.nosim = true;
    Ok(())
}

fn handle_multflt(keyword: &DeckKeyword, schedule: &mut Schedule, step: usize) -> ScheduleResult<()> {
    schedule
        .modifier_decks
        .entry(step)
        .or_default()
        .push(keyword.clone());
    schedule.events.add_event(ScheduleEvent::GeoModifier, step);
    Ok(())
}

fn handle_unsupported_geo_modifier(
    keyword: &DeckKeyword,
    schedule: &mut Schedule,
    step: usize,
) -> ScheduleResult<()> {
    schedule.config.handle(
        ParseErrorKind::UnsupportedGeoModifier,
        format!(
            "geo modifier {} at step {step} is not applied in SCHEDULE",
            keyword.name()
        ),
        &mut schedule.messages,
    )
}

fn defer_rft(keyword: &DeckKeyword, schedule: &mut Schedule, step: usize) -> ScheduleResult<()> {
    schedule.deferred_rft.push((keyword.clone(), step));
    Ok(())
}

/// Applies a WRFT or WRFTPLT keyword once every well status is known.
pub(super) fn apply_rft(keyword: &DeckKeyword, schedule: &mut Schedule, step: usize) -> ScheduleResult<()> {
    let last_step = schedule.time_map.last_step();
    if keyword.name() == "WRFT" {
        each_record(keyword, |record| {
            let item = record.item("WELL")?;
            if !item.has_value(0) {
                return Ok(());
            }
            for well_name in schedule.wells_matching(item.get_string(0)?)? {
                let well = schedule.well_mut(&well_name)?;
                well.set_rft_active(step, true);
                if step < last_step {
                    well.set_rft_active(step + 1, false);
                }
            }
            Ok(())
        })?;
        for well in &mut schedule.wells {
            well.set_rft_when_first_open(step, last_step);
        }
        return Ok(());
    }

    each_record(keyword, |record| {
        let rft = text(record, "OUTPUT_RFT")?;
        let plt = text(record, "OUTPUT_PLT")?;
        for well_name in schedule.wells_matching(text(record, "WELL")?)? {
            let well = schedule.well_mut(&well_name)?;
            match rft {
                "YES" | "REPT" | "TIMESTEP" => {
                    well.set_rft_active(step, true);
                }
                "FOPN" => well.set_rft_when_first_open(step, last_step),
                "NO" => {
                    well.set_rft_active(step, false);
                }
                other => return Err(invalid_output_mode("OUTPUT_RFT", other)),
            }
            match plt {
                "YES" | "REPT" | "TIMESTEP" => {
                    well.set_plt_active(step, true);
                }
                "NO" => {
                    well.set_plt_active(step, false);
                }
                other => return Err(invalid_output_mode("OUTPUT_PLT", other)),
            }
        }
        Ok(())
    })
}

fn invalid_output_mode(item: &str, value: &str) -> EclError {
    EclError::invalid_input(
        "SCHEDULE.INVALID_OUTPUT_MODE",
        format!("'{value}' is not a valid {item} setting"),
    )
}

#[cfg(test)]
mod tests {
    use super::{HandlerRegistry, KeywordHandler};
    use crate::deck::DeckKeyword;
    use crate::domain::ScheduleResult;
    use crate::schedule::Schedule;

    fn count_only(_: &DeckKeyword, _: &mut Schedule, _: usize) -> ScheduleResult<()> {
        Ok(())
    }

    #[test]
    fn builtin_registry_covers_geo_modifiers() {
        let registry = HandlerRegistry::builtin();
        assert!(registry.contains("WELSPECS"));
        assert!(registry.contains("MULTFLT"));
        assert!(registry.contains("MULTZ-"));
        assert!(registry.contains("TUNING"));
        assert!(!registry.contains("COMPLUMP"));
    }

    #[test]
    fn register_returns_the_replaced_handler() {
        let mut registry = HandlerRegistry::new();
        assert!(registry.register("WSEGVALV", count_only).is_none());
        assert!(registry.register("WSEGVALV", count_only).is_some());
        assert_eq!(registry.names(), vec!["WSEGVALV"]);
    }

    #[test]
    fn fn_items_are_handlers() {
        fn assert_handler(_: &dyn KeywordHandler) {}
        assert_handler(&count_only);
    }
}
