use chrono::NaiveDate;
use ecl_core::common::{ParseConfig, Severity};
use ecl_core::deck::DeckParser;
use ecl_core::domain::{EclError, EclErrorCategory};
use ecl_core::schedule::{
    CompletionState, OilVaporization, ProducerControl, Schedule, ScheduleEvent, WellStatus,
};
use ecl_core::schema::SchemaRegistry;

const BASE: &str = "
RUNSPEC
START
 1 JAN 2000 /
SCHEDULE
WELSPECS
 'OP1' 'G1' 3 4 1* 'OIL' /
 'OP2' 'G1' 5 6 1* 'OIL' /
 'OP3' 'G2' 7 8 1* 'OIL' 3* 'NO' /
/
";

fn try_schedule(body: &str, config: &ParseConfig) -> Result<Schedule, EclError> {
    let registry = SchemaRegistry::builtin();
    let parsed = DeckParser::new(&registry, config).parse_str(&format!("{BASE}{body}"))?;
    Schedule::new(&parsed.deck, config)
}

fn schedule(body: &str) -> Schedule {
    try_schedule(body, &ParseConfig::default()).expect("schedule should build")
}

fn schedule_error(body: &str) -> EclError {
    try_schedule(body, &ParseConfig::default()).expect_err("schedule should fail")
}

#[test]
fn dates_then_tstep_advance_the_report_step() {
    let schedule = schedule(
        "
DATES
 1 FEB 2000 /
 1 MAR 2000 /
/
WCONPROD
 'OP1' 'OPEN' 'ORAT' 1000 /
/
TSTEP
 1 2 3 /
WELOPEN
 'OP1' 'SHUT' /
/
",
    );

    assert_eq!(schedule.num_timesteps(), 5);
    assert_eq!(
        schedule.events().steps_with(ScheduleEvent::ProductionUpdate),
        vec![2]
    );
    assert_eq!(
        schedule.events().steps_with(ScheduleEvent::WellStatusChange),
        vec![2, 5]
    );
    let end = NaiveDate::from_ymd_opt(2000, 3, 7).and_then(|date| date.and_hms_opt(0, 0, 0));
    assert_eq!(schedule.time_map().time(5), end);
    assert_eq!(schedule.time_map().days_until(2), Some(60.0));
}

#[test]
fn production_properties_are_forward_filled() {
    let schedule = schedule(
        "
TSTEP
 4*10 /
WCONPROD
 'OP1' 'OPEN' 'ORAT' 1000 /
/
TSTEP
 3*10 /
",
    );
    let well = schedule.well("OP1").expect("OP1 is defined");

    assert_eq!(schedule.num_timesteps(), 7);
    assert_eq!(well.production_properties(7), well.production_properties(4));
    assert_eq!(
        well.production_properties(7).control_mode,
        Some(ProducerControl::Orat)
    );
    let expected = schedule
        .unit_system()
        .to_si("LiquidSurfaceVolume/Time", 1000.0);
    assert!((well.production_properties(5).oil_rate - expected).abs() < 1e-12);
    assert_eq!(well.production_properties(3).control_mode, None);
    assert_eq!(well.status(7), WellStatus::Open);
    assert_eq!(well.status(3), WellStatus::Shut);
}

#[test]
fn repeated_shut_raises_a_single_event() {
    let mut schedule = schedule(
        "
WCONPROD
 'OP1' 'OPEN' 'ORAT' 1000 /
/
TSTEP
 10 10 /
",
    );
    assert!(
        schedule
            .update_well_status("OP1", 2, WellStatus::Shut)
            .expect("OP1 exists")
    );
    assert!(
        !schedule
            .update_well_status("OP1", 2, WellStatus::Shut)
            .expect("OP1 exists")
    );
    assert_eq!(
        schedule.events().steps_with(ScheduleEvent::WellStatusChange),
        vec![0, 2]
    );
    let well = schedule.well("OP1").expect("OP1 is defined");
    assert_eq!(well.status(1), WellStatus::Open);
    assert_eq!(well.status(2), WellStatus::Shut);
}

#[test]
fn welopen_with_cells_changes_only_matching_completions() {
    let schedule = schedule(
        "
COMPDAT
 'OP1' 3 4 1 3 'OPEN' /
/
TSTEP
 10 /
WELOPEN
 'OP1' 'SHUT' 3 4 2 /
/
",
    );
    let well = schedule.well("OP1").expect("OP1 is defined");

    let before: Vec<CompletionState> = well.completions(0).iter().map(|c| c.state).collect();
    assert_eq!(before, vec![CompletionState::Open; 3]);
    let after: Vec<CompletionState> = well.completions(1).iter().map(|c| c.state).collect();
    assert_eq!(
        after,
        vec![CompletionState::Open, CompletionState::Shut, CompletionState::Open]
    );
    assert!(schedule.events().has_event(ScheduleEvent::CompletionChange, 1));
    assert_eq!(schedule.max_num_completions(1), 3);
}

#[test]
fn shutting_every_completion_shuts_the_well() {
    let schedule = schedule(
        "
COMPDAT
 'OP1' 3 4 1 2 'OPEN' /
/
WCONPROD
 'OP1' 'OPEN' 'ORAT' 1000 /
/
TSTEP
 10 /
WELOPEN
 'OP1' 'SHUT' 0 0 0 /
/
",
    );
    let well = schedule.well("OP1").expect("OP1 is defined");
    assert_eq!(well.status(0), WellStatus::Open);
    assert_eq!(well.status(1), WellStatus::Shut);
    assert!(well.completions(1).all_shut());
}

#[test]
fn completion_numbers_conflict_with_complump() {
    let error = schedule_error(
        "
COMPDAT
 'OP1' 3 4 1 3 'OPEN' /
/
COMPLUMP
 'OP1' 3 4 1 3 1 /
/
WELOPEN
 'OP1' 'SHUT' 3* 1 2 /
/
",
    );
    assert_eq!(error.placeholder(), "SCHEDULE.INVALID_KEYWORD_COMBINATION");
    assert_eq!(error.category(), EclErrorCategory::InvalidInputError);
    assert_eq!(
        error.location().and_then(|location| location.keyword.as_deref()),
        Some("WELOPEN")
    );
}

#[test]
fn invalid_control_mode_names_the_well() {
    let error = schedule_error(
        "
WCONPROD
 'OP2' 'OPEN' 'WRAT' 1000 /
/
",
    );
    assert_eq!(error.placeholder(), "SCHEDULE.INVALID_CONTROL_MODE");
    assert!(
        error
            .to_string()
            .contains("Tried to set invalid control: WRAT for well: OP2")
    );
}

#[test]
fn weltarg_rejects_unknown_modes() {
    let error = schedule_error(
        "
WCONPROD
 'OP1' 'OPEN' 'ORAT' 1000 /
/
WELTARG
 'OP1' 'CRAT' 10 /
/
",
    );
    assert_eq!(error.placeholder(), "SCHEDULE.INVALID_WELTARG_MODE");
}

#[test]
fn weltarg_updates_the_producer_target() {
    let schedule = schedule(
        "
WCONPROD
 'OP1' 'OPEN' 'ORAT' 1000 /
/
TSTEP
 10 /
WELTARG
 'OP1' 'ORAT' 500 /
/
",
    );
    let well = schedule.well("OP1").expect("OP1 is defined");
    let units = schedule.unit_system();
    let target = units.to_si("LiquidSurfaceVolume/Time", 500.0);
    assert!((well.production_properties(1).oil_rate - target).abs() < 1e-12);
    assert!(schedule.events().has_event(ScheduleEvent::ProductionUpdate, 1));
}

#[test]
fn group_polymer_concentration_is_rejected() {
    let error = schedule_error(
        "
WPOLYMER
 'OP1' 1.0 0.0 'G1' /
/
",
    );
    assert_eq!(error.placeholder(), "SCHEDULE.UNSUPPORTED_GROUP_CONCENTRATION");
}

#[test]
fn banned_crossflow_with_zero_rate_shuts_the_well() {
    let schedule = schedule(
        "
WCONHIST
 'OP3' 'OPEN' 'ORAT' 0 0 0 /
/
TSTEP
 10 /
WELOPEN
 'OP3' 'OPEN' /
/
",
    );
    let well = schedule.well("OP3").expect("OP3 is defined");
    assert!(!well.allows_cross_flow());
    assert_eq!(well.status(0), WellStatus::Shut);
    assert_eq!(well.status(1), WellStatus::Shut);

    let placeholders: Vec<&str> = schedule
        .messages()
        .iter()
        .map(|message| message.placeholder)
        .collect();
    assert_eq!(placeholders, vec!["SCHEDULE.AUTO_SHUT", "SCHEDULE.CANNOT_OPEN"]);
    assert_eq!(schedule.messages().count(Severity::Info), 2);
}

#[test]
fn geo_modifiers_follow_the_configured_action() {
    const BODY: &str = "
TSTEP
 10 /
MULTX
 1.0 2.0 /
";
    let lenient = try_schedule(BODY, &ParseConfig::default()).expect("warn mode keeps going");
    let warnings: Vec<&str> = lenient
        .messages()
        .iter()
        .filter(|message| message.severity == Severity::Warning)
        .map(|message| message.placeholder)
        .collect();
    assert_eq!(warnings, vec!["SCHEDULE.UNSUPPORTED_GEO_MODIFIER"]);

    let error = try_schedule(BODY, &ParseConfig::strict()).expect_err("strict mode stops");
    assert_eq!(error.placeholder(), "SCHEDULE.UNSUPPORTED_GEO_MODIFIER");
    assert_eq!(error.category(), EclErrorCategory::UnsupportedFeatureError);
}

#[test]
fn multflt_is_collected_per_step() {
    let schedule = schedule(
        "
TSTEP
 10 /
MULTFLT
 'F1' 0.5 /
 'F2' 0.1 /
/
",
    );
    let deck = schedule.modifier_deck(1).expect("step 1 has modifiers");
    assert_eq!(deck.count("MULTFLT"), 1);
    assert_eq!(deck.keywords()[0].len(), 2);
    assert!(schedule.modifier_deck(0).is_none());
    assert_eq!(
        schedule.events().steps_with(ScheduleEvent::GeoModifier),
        vec![1]
    );
}

#[test]
fn group_tree_and_targets_are_versioned() {
    let schedule = schedule(
        "
TSTEP
 10 /
GRUPTREE
 'G1' 'PLAT' /
 'PLAT' 'FIELD' /
/
GCONPROD
 'G1' 'ORAT' 2000 /
/
GEFAC
 'G1' 0.9 'NO' /
/
",
    );
    assert_eq!(schedule.group_tree(0).parent("G1"), Some("FIELD"));
    assert_eq!(schedule.group_tree(1).parent("G1"), Some("PLAT"));
    assert_eq!(schedule.group_tree(1).children("PLAT"), vec!["G1"]);

    let group = schedule.group("G1").expect("G1 is defined");
    assert!(group.is_production_group(1));
    assert!(!group.is_production_group(0));
    assert_eq!(group.efficiency_factor(1), 0.9);
    assert!(!group.transfer_efficiency(1));
    assert!(group.has_well("OP1", 1));
}

#[test]
fn injector_and_vaporization_state_is_recorded() {
    let schedule = schedule(
        "
WCONINJE
 'OP2' 'GAS' 'OPEN' 'RATE' 5000 /
/
WSOLVENT
 'OP2' 0.25 /
/
DRSDT
 0.0 /
",
    );
    let well = schedule.well("OP2").expect("OP2 is defined");
    assert!(well.is_injector(0));
    assert_eq!(well.status(0), WellStatus::Open);
    assert_eq!(well.solvent_fraction(0), 0.25);
    assert!(schedule.events().has_event(ScheduleEvent::InjectionUpdate, 0));
    assert_eq!(
        schedule.oil_vaporization(0),
        Some(OilVaporization::Drsdt {
            max_rate: 0.0,
            all_cells: true
        })
    );
}

#[test]
fn wrft_requests_output_when_the_well_first_opens() {
    let schedule = schedule(
        "
WRFT
/
TSTEP
 10 10 /
WCONPROD
 'OP1' 'OPEN' 'ORAT' 1000 /
/
TSTEP
 10 /
",
    );
    let well = schedule.well("OP1").expect("OP1 is defined");
    assert!(!well.rft_active(0));
    assert!(well.rft_active(2));
    assert!(!well.rft_active(3));
}

#[test]
fn oversized_tstep_is_a_schedule_error() {
    for steps in ["1E12", "1E300"] {
        let error = schedule_error(&format!("TSTEP\n {steps} /\n"));
        assert_eq!(error.placeholder(), "SCHEDULE.TIME_STEP_RANGE");
        assert_eq!(error.category(), EclErrorCategory::InvalidInputError);
        let keyword = error.location().and_then(|location| location.keyword.as_deref());
        assert_eq!(keyword, Some("TSTEP"));
    }
}

#[test]
fn tuning_is_forward_filled_and_raises_an_event() {
    let schedule = schedule(
        "
TSTEP
 10 /
TUNING
 2 30 /
 /
 2* 50 /
TSTEP
 10 10 /
",
    );
    let day = 86_400.0;

    assert!((schedule.tuning(0).tsinit - day).abs() < 1e-9);
    assert!((schedule.tuning(1).tsinit - 2.0 * day).abs() < 1e-9);
    assert!((schedule.tuning(3).tsmaxz - 30.0 * day).abs() < 1e-9);
    assert_eq!(schedule.tuning(3).litmax, 50);
    assert_eq!(schedule.tuning(3).newtmx, 12);
    assert_eq!(schedule.tuning(3).tmaxwc, None);
    assert_eq!(
        schedule.events().steps_with(ScheduleEvent::TuningChange),
        vec![1]
    );
}

#[test]
fn restart_output_follows_rptrst_and_rptsched() {
    let schedule = schedule(
        "
RPTRST
 BASIC=3 FREQ=3 /
TSTEP
 6*10 /
RPTSCHED
 RESTART=1 /
TSTEP
 2*10 /
RPTSCHED
 NOTHING /
TSTEP
 2*10 /
",
    );
    let written: Vec<usize> = (0..=schedule.num_timesteps())
        .filter(|step| schedule.write_restart_file(*step))
        .collect();

    assert_eq!(written, vec![1, 4, 7, 8, 10]);
    assert_eq!(schedule.restart_schedule(0).basic, 0);
    assert_eq!(schedule.restart_schedule(1).basic, 3);
    assert_eq!(schedule.restart_schedule(9).rptsched_restart, Some(0));
    assert!(!schedule.write_restart_file(11));
}

const SEGMENTED_OP2: &str = "
COMPDAT
 'OP2' 5 6 1 3 'OPEN' /
/
WELSEGS
 'OP2' 2512.5 2512.5 1.0E-5 'ABS' 'HF-' 'HO' /
 2 2 1 1 2537.5 2537.5 0.3 1.0E-4 /
 3 6 1 2 2637.5 2587.5 0.2 1.0E-4 /
/
";

#[test]
fn welsegs_builds_incremental_and_absolute_segments() {
    let schedule = schedule(&format!(
        "
WELSEGS
 'OP1' 2000 10 1* 'INC' /
 2 4 1 1 50 5 0.2 1E-4 /
/
{SEGMENTED_OP2}"
    ));

    let incremental = schedule
        .well("OP1")
        .and_then(|well| well.segment_set(0))
        .expect("OP1 has segments");
    let last = incremental.get(4).expect("segment 4 is defined");
    assert_eq!(incremental.len(), 4);
    assert_eq!(last.outlet, 3);
    assert!((last.total_length - 160.0).abs() < 1e-9);
    assert!((last.depth - 2015.0).abs() < 1e-9);

    let absolute = schedule
        .well("OP2")
        .and_then(|well| well.segment_set(0))
        .expect("OP2 has segments");
    let third = absolute.get(3).expect("segment 3 is defined");
    assert!((third.total_length - 2562.5).abs() < 1e-9);
    assert!((third.depth - 2550.0).abs() < 1e-9);
    assert_eq!(absolute.get(6).map(|segment| segment.depth), Some(2587.5));
    assert_eq!(
        schedule.well("OP3").map(|well| well.is_multi_segment(0)),
        Some(false)
    );
}

#[test]
fn compsegs_assigns_completions_to_segments() {
    let schedule = schedule(&format!(
        "{SEGMENTED_OP2}
TSTEP
 10 /
COMPSEGS
 'OP2' /
 5 6 1 1 2512.5 2537.5 /
 5 6 2 1 2540.0 2580.0 /
 5 6 3 1 2600.0 2620.0 4* 6 /
/
"
    ));
    let well = schedule.well("OP2").expect("OP2 is defined");

    let assigned: Vec<(i32, Option<i32>)> = well
        .completions(1)
        .iter()
        .map(|completion| (completion.k, completion.segment_number))
        .collect();
    assert_eq!(assigned, vec![(0, Some(2)), (1, Some(3)), (2, Some(6))]);
    let depths: Vec<Option<f64>> = well.completions(1).iter().map(|c| c.center_depth).collect();
    assert_eq!(depths, vec![Some(2537.5), Some(2550.0), Some(2587.5)]);
    assert!(well.completions(0).iter().all(|c| c.segment_number.is_none()));
    assert!(schedule.events().has_event(ScheduleEvent::CompletionChange, 1));
}

#[test]
fn compsegs_needs_segments_and_completions() {
    let without_segments = schedule_error(
        "
COMPDAT
 'OP1' 3 4 1 1 'OPEN' /
/
COMPSEGS
 'OP1' /
 3 4 1 1 0.0 10.0 /
/
",
    );
    assert_eq!(without_segments.placeholder(), "SCHEDULE.INVALID_COMPSEGS");
    let keyword = without_segments
        .location()
        .and_then(|location| location.keyword.as_deref());
    assert_eq!(keyword, Some("COMPSEGS"));

    let missing_cell = schedule_error(&format!(
        "{SEGMENTED_OP2}
COMPSEGS
 'OP2' /
 1 1 1 1 2512.5 2537.5 /
/
"
    ));
    assert_eq!(missing_cell.placeholder(), "SCHEDULE.INVALID_COMPSEGS");
    assert_eq!(missing_cell.location().and_then(|location| location.record), Some(1));
}

#[test]
fn wpimult_scales_productivity_without_a_completion_event() {
    let schedule = schedule(
        "
COMPDAT
 'OP1' 3 4 1 2 'OPEN' /
/
TSTEP
 10 /
WPIMULT
 'OP1' 0.5 /
/
",
    );
    let well = schedule.well("OP1").expect("OP1 is defined");

    assert!(well.completions(1).iter().all(|c| (c.well_pi - 0.5).abs() < 1e-12));
    assert!(well.completions(0).iter().all(|c| c.well_pi == 1.0));
    assert!(!schedule.events().has_event(ScheduleEvent::CompletionChange, 1));
}
