use super::{ItemSchema as I, KeywordSchema as K, KeywordSize, Section};

const LIQUID_RATE: &str = "LiquidSurfaceVolume/Time";
const GAS_RATE: &str = "GasSurfaceVolume/Time";
const RESV_RATE: &str = "ReservoirVolume/Time";
const PRESSURE: &str = "Pressure";
const LENGTH: &str = "Length";
const TIME: &str = "Time";

const ANYWHERE: &[Section] = &[];
const RUNSPEC: &[Section] = &[Section::Runspec];
const PROPS: &[Section] = &[Section::Props];
const SCHEDULE: &[Section] = &[Section::Schedule];
const GRID_EDIT_SCHEDULE: &[Section] = &[Section::Grid, Section::Edit, Section::Schedule];
const RUNSPEC_SCHEDULE: &[Section] = &[Section::Runspec, Section::Schedule];
const SOLUTION_SCHEDULE: &[Section] = &[Section::Solution, Section::Schedule];

/// Grid multipliers that are accepted by the grammar but not applied.
pub const UNSUPPORTED_GEO_MODIFIERS: &[&str] = &[
    "MULTPV", "MULTX", "MULTX-", "MULTY", "MULTY-", "MULTZ", "MULTZ-", "MULTREGT", "MULTR",
    "MULTR-", "MULTSIG", "MULTSIGV", "MULTTHT", "MULTTHT-",
];

pub(super) fn keywords() -> Vec<K> {
    let mut keywords = Vec::new();

    for marker in [
        "RUNSPEC", "GRID", "EDIT", "PROPS", "REGIONS", "SOLUTION", "SUMMARY", "SCHEDULE", "END",
    ] {
        keywords.push(K::new(marker, KeywordSize::None).in_sections(ANYWHERE));
    }
    for units in ["METRIC", "FIELD", "LAB"] {
        keywords.push(K::new(units, KeywordSize::None).in_sections(RUNSPEC));
    }
    keywords.push(K::new("NOSIM", KeywordSize::None).in_sections(RUNSPEC_SCHEDULE));

    keywords.extend(runspec_and_props());
    keywords.extend(timing());
    keywords.extend(tuning_and_reports());
    keywords.extend(wells());
    keywords.extend(multisegment_wells());
    keywords.extend(groups());
    keywords.extend(geo_modifiers());
    keywords
}

fn runspec_and_props() -> Vec<K> {
    vec![
        K::new("TABDIMS", KeywordSize::Fixed(1))
            .in_sections(RUNSPEC)
            .items(vec![
                I::int("NTSFUN").default_int(1),
                I::int("NTPVT").default_int(1),
                I::int("NSSFUN").default_int(20),
                I::int("NPPVT").default_int(20),
                I::int("NTFIP").default_int(1),
                I::int("NRPVT").default_int(20),
            ]),
        K::new("ROCKCOMP", KeywordSize::Fixed(1))
            .in_sections(RUNSPEC)
            .items(vec![
                I::string("ROCKOPT").default_str("REVERS"),
                I::int("NTROCC").default_int(1),
                I::string("WATER_COMPACTION").default_str("NO"),
            ]),
        K::new("ROCKOPTS", KeywordSize::Fixed(1))
            .in_sections(PROPS)
            .items(vec![
                I::string("METHOD").default_str("PRESSURE"),
                I::string("REF_PRESSURE").default_str("NOSTORE"),
                I::string("TABLE_TYPE").default_str("PVTNUM"),
                I::string("HYST_OPT").default_str("DEFAULT"),
            ]),
        K::new("RKTRMDIR", KeywordSize::None).in_sections(PROPS),
        K::new(
            "ROCKTAB",
            KeywordSize::Table {
                keyword: "ROCKCOMP",
                item: "NTROCC",
                default: 1,
                records_per_table: 1,
            },
        )
        .in_sections(PROPS)
        .items(vec![I::double("DATA").all()]),
        K::new(
            "PLYSHLOG",
            KeywordSize::Table {
                keyword: "TABDIMS",
                item: "NTPVT",
                default: 1,
                records_per_table: 2,
            },
        )
        .in_sections(PROPS)
        .items(vec![
            I::double("REF_POLYMER_CONCENTRATION"),
            I::double("REF_SALINITY"),
            I::double("REF_TEMPERATURE"),
        ])
        .items(vec![I::double("DATA").all()]),
    ]
}

fn timing() -> Vec<K> {
    vec![
        K::new("START", KeywordSize::Fixed(1))
            .in_sections(RUNSPEC)
            .items(vec![
                I::int("DAY").default_int(1),
                I::string("MONTH").default_str("JAN"),
                I::int("YEAR").default_int(1983),
                I::string("TIME").default_str("00:00:00.000"),
            ]),
        K::new("DATES", KeywordSize::SlashTerminated)
            .in_sections(SCHEDULE)
            .items(vec![
                I::int("DAY"),
                I::string("MONTH"),
                I::int("YEAR"),
                I::string("TIME").default_str("00:00:00.000"),
            ]),
        K::new("TSTEP", KeywordSize::Fixed(1))
            .in_sections(SCHEDULE)
            .items(vec![I::double("step_list").dimension("Time").all()]),
        K::new("DRSDT", KeywordSize::Fixed(1))
            .in_sections(SCHEDULE)
            .items(vec![
                I::double("DRSDT_MAX"),
                I::string("OPTION").default_str("ALL"),
            ]),
        K::new("DRVDT", KeywordSize::Fixed(1))
            .in_sections(SCHEDULE)
            .items(vec![I::double("DRVDT_MAX")]),
        K::new("VAPPARS", KeywordSize::Fixed(1))
            .in_sections(SCHEDULE)
            .items(vec![
                I::double("OIL_VAP_PROPENSITY"),
                I::double("OIL_DENSITY_PROPENSITY"),
            ]),
    ]
}

fn tuning_and_reports() -> Vec<K> {
    vec![
        K::new("TUNING", KeywordSize::Fixed(3))
            .in_sections(SCHEDULE)
            .items(vec![
                I::double("TSINIT").default_double(1.0).dimension(TIME),
                I::double("TSMAXZ").default_double(365.0).dimension(TIME),
                I::double("TSMINZ").default_double(0.1).dimension(TIME),
                I::double("TSMCHP").default_double(0.15).dimension(TIME),
                I::double("TSFMAX").default_double(3.0),
                I::double("TSFMIN").default_double(0.3),
                I::double("TSFCNV").default_double(0.1),
                I::double("TFDIFF").default_double(1.25),
                I::double("THRUPT").default_double(1.0e20),
                I::double("TMAXWC").dimension(TIME),
            ])
            .items(vec![
                I::double("TRGTTE").default_double(0.1),
                I::double("TRGCNV").default_double(0.001),
                I::double("TRGMBE").default_double(1.0e-7),
                I::double("TRGLCV").default_double(0.0001),
                I::double("XXXTTE").default_double(10.0),
                I::double("XXXCNV").default_double(0.01),
                I::double("XXXMBE").default_double(1.0e-6),
                I::double("XXXLCV").default_double(0.001),
                I::double("XXXWFL").default_double(0.001),
                I::double("TRGFIP").default_double(0.025),
                I::double("TRGSFT"),
                I::double("THIONX").default_double(0.01),
                I::int("TRWGHT").default_int(1),
            ])
            .items(vec![
                I::int("NEWTMX").default_int(12),
                I::int("NEWTMN").default_int(1),
                I::int("LITMAX").default_int(25),
                I::int("LITMIN").default_int(1),
                I::int("MXWSIT").default_int(8),
                I::int("MXWPIT").default_int(8),
                I::double("DDPLIM").default_double(1.0e6).dimension(PRESSURE),
                I::double("DDSLIM").default_double(1.0e6),
                I::double("TRGDPR").default_double(1.0e6).dimension(PRESSURE),
                I::double("XXXDPR").dimension(PRESSURE),
            ]),
        K::new("RPTRST", KeywordSize::Fixed(1))
            .in_sections(SOLUTION_SCHEDULE)
            .items(vec![I::raw_string("MNEMONIC_LIST").all()]),
        K::new("RPTSCHED", KeywordSize::Fixed(1))
            .in_sections(SCHEDULE)
            .items(vec![I::raw_string("MNEMONIC_LIST").all()]),
    ]
}

fn multisegment_wells() -> Vec<K> {
    vec![
        K::new("WELSEGS", KeywordSize::SlashTerminated)
            .in_sections(SCHEDULE)
            .header_items(vec![
                I::string("WELL"),
                I::double("DEPTH").dimension(LENGTH),
                I::double("LENGTH").default_double(0.0).dimension(LENGTH),
                I::double("WELLBORE_VOLUME").default_double(1.0e-5).dimension("Length*Length*Length"),
                I::string("INFO_TYPE"),
                I::string("PRESSURE_COMPONENTS").default_str("HFA"),
                I::string("FLOW_MODEL").default_str("HO"),
                I::double("TOP_X").default_double(0.0).dimension(LENGTH),
                I::double("TOP_Y").default_double(0.0).dimension(LENGTH),
            ])
            .items(vec![
                I::int("SEGMENT1"),
                I::int("SEGMENT2"),
                I::int("BRANCH"),
                I::int("JOIN_SEGMENT"),
                I::double("SEGMENT_LENGTH").dimension(LENGTH),
                I::double("DEPTH_CHANGE").dimension(LENGTH),
                I::double("DIAMETER").dimension(LENGTH),
                I::double("ROUGHNESS").dimension(LENGTH),
                I::double("AREA").dimension("Length*Length"),
                I::double("VOLUME").dimension("Length*Length*Length"),
                I::double("LENGTH_X").default_double(0.0).dimension(LENGTH),
                I::double("LENGTH_Y").default_double(0.0).dimension(LENGTH),
            ]),
        K::new("COMPSEGS", KeywordSize::SlashTerminated)
            .in_sections(SCHEDULE)
            .header_items(vec![I::string("WELL")])
            .items(vec![
                I::int("I"),
                I::int("J"),
                I::int("K"),
                I::int("BRANCH"),
                I::double("DISTANCE_START").dimension(LENGTH),
                I::double("DISTANCE_END").dimension(LENGTH),
                I::string("DIRECTION"),
                I::int("END_IJK"),
                I::double("CENTER_DEPTH").default_double(0.0).dimension(LENGTH),
                I::double("THERMAL_LENGTH").dimension(LENGTH),
                I::int("SEGMENT_NUMBER"),
            ]),
    ]
}

fn wells() -> Vec<K> {
    let slash = || KeywordSize::SlashTerminated;
    vec![
        K::new("WELSPECS", slash())
            .in_sections(SCHEDULE)
            .items(vec![
                I::string("WELL"),
                I::string("GROUP"),
                I::int("HEAD_I"),
                I::int("HEAD_J"),
                I::double("REF_DEPTH").dimension(LENGTH),
                I::string("PHASE"),
                I::double("D_RADIUS").default_double(0.0).dimension(LENGTH),
                I::string("INFLOW_EQ").default_str("STD"),
                I::string("AUTO_SHUTIN").default_str("SHUT"),
                I::string("CROSSFLOW").default_str("YES"),
                I::int("P_TABLE").default_int(0),
                I::string("DENSITY_CALC").default_str("SEG"),
                I::int("FIP_REGION").default_int(0),
                I::string("FRONTSIM1"),
                I::string("FRONTSIM2"),
                I::string("well_model").default_str("STD"),
                I::int("POLYMER_TABLE").default_int(0),
            ]),
        K::new("COMPDAT", slash())
            .in_sections(SCHEDULE)
            .items(vec![
                I::string("WELL"),
                I::int("I").default_int(0),
                I::int("J").default_int(0),
                I::int("K1"),
                I::int("K2"),
                I::string("STATE").default_str("OPEN"),
                I::int("SAT_TABLE").default_int(0),
                I::double("CONNECTION_TRANSMISSIBILITY_FACTOR"),
                I::double("DIAMETER").dimension(LENGTH),
                I::double("Kh").default_double(-1.0),
                I::double("SKIN").default_double(0.0),
                I::double("D_FACTOR").default_double(0.0),
                I::string("DIR").default_str("Z"),
                I::double("PR").dimension(LENGTH),
            ]),
        K::new("COMPORD", slash())
            .in_sections(SCHEDULE)
            .items(vec![
                I::string("WELL"),
                I::string("ORDER_TYPE").default_str("TRACK"),
            ]),
        K::new("COMPLUMP", slash())
            .in_sections(SCHEDULE)
            .items(vec![
                I::string("WELL"),
                I::int("I"),
                I::int("J"),
                I::int("K1"),
                I::int("K2"),
                I::int("N"),
            ]),
        K::new("WCONPROD", slash())
            .in_sections(SCHEDULE)
            .items(vec![
                I::string("WELL"),
                I::string("STATUS").default_str("OPEN"),
                I::string("CMODE"),
                I::double("ORAT").default_double(0.0).dimension(LIQUID_RATE),
                I::double("WRAT").default_double(0.0).dimension(LIQUID_RATE),
                I::double("GRAT").default_double(0.0).dimension(GAS_RATE),
                I::double("LRAT").default_double(0.0).dimension(LIQUID_RATE),
                I::double("RESV").default_double(0.0).dimension(RESV_RATE),
                I::double("BHP").default_double(1.01325).dimension(PRESSURE),
                I::double("THP").default_double(0.0).dimension(PRESSURE),
                I::int("VFP_TABLE").default_int(0),
                I::double("ALQ").default_double(0.0),
            ]),
        K::new("WCONHIST", slash())
            .in_sections(SCHEDULE)
            .items(vec![
                I::string("WELL"),
                I::string("STATUS").default_str("OPEN"),
                I::string("CMODE"),
                I::double("ORAT").default_double(0.0).dimension(LIQUID_RATE),
                I::double("WRAT").default_double(0.0).dimension(LIQUID_RATE),
                I::double("GRAT").default_double(0.0).dimension(GAS_RATE),
                I::int("VFP_TABLE").default_int(0),
                I::double("LIFT").default_double(0.0),
                I::double("THP").default_double(0.0).dimension(PRESSURE),
                I::double("BHP").default_double(0.0).dimension(PRESSURE),
                I::double("NGLRAT").default_double(0.0).dimension(LIQUID_RATE),
            ]),
        K::new("WCONINJE", slash())
            .in_sections(SCHEDULE)
            .items(vec![
                I::string("WELL"),
                I::string("TYPE"),
                I::string("STATUS").default_str("OPEN"),
                I::string("CMODE"),
                I::double("RATE"),
                I::double("RESV").dimension(RESV_RATE),
                I::double("BHP").default_double(6895.0).dimension(PRESSURE),
                I::double("THP").dimension(PRESSURE),
                I::int("VFP_TABLE").default_int(0),
                I::double("VAPOIL_C").default_double(0.0),
                I::double("GAS_STEAM_RATIO").default_double(0.0),
                I::double("SURFACE_OIL_FRACTION").default_double(0.0),
                I::double("SURFACE_WATER_FRACTION").default_double(0.0),
                I::double("SURFACE_GAS_FRACTION").default_double(0.0),
                I::double("OIL_STEAM_RATIO").default_double(0.0),
            ]),
        K::new("WCONINJH", slash())
            .in_sections(SCHEDULE)
            .items(vec![
                I::string("WELL"),
                I::string("TYPE"),
                I::string("STATUS").default_str("OPEN"),
                I::double("RATE"),
                I::double("BHP").dimension(PRESSURE),
                I::double("THP").dimension(PRESSURE),
                I::int("VFP_TABLE").default_int(0),
                I::double("VAPOIL_C").default_double(0.0),
                I::double("SURFACE_OIL_FRACTION").default_double(0.0),
                I::double("SURFACE_WATER_FRACTION").default_double(0.0),
                I::double("SURFACE_GAS_FRACTION").default_double(0.0),
                I::string("CMODE").default_str("RATE"),
            ]),
        K::new("WPOLYMER", slash())
            .in_sections(SCHEDULE)
            .items(vec![
                I::string("WELL"),
                I::double("POLYMER_CONCENTRATION"),
                I::double("SALT_CONCENTRATION"),
                I::string("GROUP_POLYMER_CONCENTRATION"),
                I::string("GROUP_SALT_CONCENTRATION"),
            ]),
        K::new("WSOLVENT", slash())
            .in_sections(SCHEDULE)
            .items(vec![I::string("WELL"), I::double("SOLVENT_FRACTION")]),
        K::new("WGRUPCON", slash())
            .in_sections(SCHEDULE)
            .items(vec![
                I::string("WELL"),
                I::string("GROUP_CONTROLLED").default_str("YES"),
                I::double("GUIDE_RATE").default_double(-1.0),
                I::string("PHASE"),
                I::double("SCALING_FACTOR").default_double(1.0),
            ]),
        K::new("WELOPEN", slash())
            .in_sections(SCHEDULE)
            .items(vec![
                I::string("WELL"),
                I::string("STATUS").default_str("OPEN"),
                I::int("I"),
                I::int("J"),
                I::int("K"),
                I::int("C1"),
                I::int("C2"),
            ]),
        K::new("WELTARG", slash())
            .in_sections(SCHEDULE)
            .items(vec![
                I::string("WELL"),
                I::string("CMODE"),
                I::double("NEW_VALUE"),
            ]),
        K::new("WPIMULT", slash())
            .in_sections(SCHEDULE)
            .items(vec![
                I::string("WELL"),
                I::double("WELLPI").default_double(1.0),
                I::int("I"),
                I::int("J"),
                I::int("K"),
                I::int("FIRST"),
                I::int("LAST"),
            ]),
        K::new("WRFT", slash())
            .in_sections(SCHEDULE)
            .items(vec![I::string("WELL")]),
        K::new("WRFTPLT", slash())
            .in_sections(SCHEDULE)
            .items(vec![
                I::string("WELL"),
                I::string("OUTPUT_RFT").default_str("NO"),
                I::string("OUTPUT_PLT").default_str("NO"),
                I::string("OUTPUT_SEGMENT").default_str("NO"),
            ]),
    ]
}

fn groups() -> Vec<K> {
    const UNLIMITED: f64 = -9.99e100;
    let slash = || KeywordSize::SlashTerminated;
    vec![
        K::new("GRUPTREE", slash())
            .in_sections(SCHEDULE)
            .items(vec![
                I::string("CHILD_GROUP"),
                I::string("PARENT_GROUP").default_str("FIELD"),
            ]),
        K::new("GCONPROD", slash())
            .in_sections(SCHEDULE)
            .items(vec![
                I::string("GROUP"),
                I::string("CONTROL_MODE").default_str("NONE"),
                I::double("OIL_TARGET")
                    .default_double(UNLIMITED)
                    .dimension(LIQUID_RATE),
                I::double("WATER_TARGET")
                    .default_double(UNLIMITED)
                    .dimension(LIQUID_RATE),
                I::double("GAS_TARGET")
                    .default_double(UNLIMITED)
                    .dimension(GAS_RATE),
                I::double("LIQUID_TARGET")
                    .default_double(UNLIMITED)
                    .dimension(LIQUID_RATE),
                I::string("EXCEED_PROC").default_str("NONE"),
                I::string("RESPOND_TO_PARENT").default_str("YES"),
                I::double("GUIDE_RATE"),
                I::string("GUIDE_RATE_DEF"),
                I::string("WATER_EXCEED_PROCEDURE"),
                I::string("GAS_EXCEED_PROCEDURE"),
                I::string("LIQUID_EXCEED_PROCEDURE"),
                I::double("RESERVOIR_FLUID_TARGET")
                    .default_double(UNLIMITED)
                    .dimension(RESV_RATE),
                I::double("RESERVOIR_VOLUME_BALANCE"),
            ]),
        K::new("GCONINJE", slash())
            .in_sections(SCHEDULE)
            .items(vec![
                I::string("GROUP"),
                I::string("PHASE"),
                I::string("CONTROL_MODE").default_str("NONE"),
                I::double("SURFACE_TARGET").default_double(0.0),
                I::double("RESV_TARGET")
                    .default_double(0.0)
                    .dimension(RESV_RATE),
                I::double("REINJ_TARGET").default_double(0.0).dimension("1"),
                I::double("VOIDAGE_TARGET").default_double(0.0).dimension("1"),
                I::string("FREE").default_str("YES"),
                I::double("GUIDE_FRACTION").default_double(0.0),
                I::string("GUIDE_DEF"),
                I::string("REINJECT_GROUP"),
                I::string("VOIDAGE_GROUP"),
                I::double("WETGAS_TARGET"),
            ]),
        K::new("GEFAC", slash())
            .in_sections(SCHEDULE)
            .items(vec![
                I::string("GROUP"),
                I::double("EFFICIENCY_FACTOR").default_double(1.0),
                I::string("TRANSFER_EXT_NET").default_str("YES"),
            ]),
    ]
}

fn geo_modifiers() -> Vec<K> {
    let mut keywords = vec![
        K::new("MULTFLT", KeywordSize::SlashTerminated)
            .in_sections(GRID_EDIT_SCHEDULE)
            .items(vec![I::string("fault"), I::double("factor")]),
        K::new("MULTREGT", KeywordSize::SlashTerminated)
            .in_sections(GRID_EDIT_SCHEDULE)
            .items(vec![
                I::int("SRC_REGION"),
                I::int("TARGET_REGION"),
                I::double("TRAN_MULT"),
                I::string("DIRECTIONS").default_str("XYZ"),
                I::string("NNC_MULT").default_str("ALL"),
                I::string("REGION_DEF").default_str("M"),
            ]),
    ];
    for name in UNSUPPORTED_GEO_MODIFIERS
        .iter()
        .copied()
        .filter(|name| *name != "MULTREGT")
    {
        keywords.push(
            K::new(name, KeywordSize::Fixed(1))
                .in_sections(GRID_EDIT_SCHEDULE)
                .items(vec![I::double("data").all()]),
        );
    }
    keywords
}
