use ecl_core::common::{MessageContainer, ParseConfig, Severity};
use ecl_core::deck::DeckParser;
use ecl_core::domain::EclResult;
use ecl_core::schema::SchemaRegistry;
use ecl_core::tables::TableManager;

const ROCKTAB: &str = "
ROCKTAB
 300 1.0  1.0
 200 0.98 1*
 100 0.95 0.9 /
";

fn load(source: &str, config: &ParseConfig) -> EclResult<(TableManager, MessageContainer)> {
    let registry = SchemaRegistry::builtin();
    let parsed = DeckParser::new(&registry, config).parse_str(source)?;
    let mut messages = parsed.messages;
    let tables = TableManager::from_deck(&parsed.deck, config, &mut messages)?;
    Ok((tables, messages))
}

#[test]
fn repeated_rocktab_is_dropped_with_one_error() {
    let source = format!("RUNSPEC\nROCKCOMP\n 'REVERS' 1 /\nPROPS\n{ROCKTAB}{ROCKTAB}");
    let (tables, messages) =
        load(&source, &ParseConfig::default()).expect("ambiguity does not abort the parse");

    assert!(tables.rocktab_tables().is_empty());
    assert_eq!(messages.count(Severity::Error), 1);
    let error = messages
        .iter()
        .find(|message| message.severity == Severity::Error)
        .expect("an error was logged");
    assert_eq!(error.placeholder, "TABLES.AMBIGUOUS_KEYWORD");
}

#[test]
fn single_rocktab_fills_defaulted_transmissibility() {
    let source = format!("RUNSPEC\nROCKCOMP\n 'REVERS' 1 /\nPROPS\n{ROCKTAB}");
    let (tables, messages) = load(&source, &ParseConfig::default()).expect("valid deck");

    assert!(messages.is_empty());
    let [table] = tables.rocktab_tables() else {
        panic!("expected exactly one ROCKTAB table");
    };
    assert_eq!(table.pressure(), &[300.0, 200.0, 100.0]);
    assert_eq!(table.pore_volume_multiplier(), &[1.0, 0.98, 0.95]);
    assert!((table.transmissibility_multiplier()[1] - 0.95).abs() < 1e-12);
}

#[test]
fn stress_option_requires_increasing_pressure() {
    let source = format!(
        "RUNSPEC\nROCKCOMP\n 'REVERS' 1 /\nPROPS\nROCKOPTS\n 'STRESS' /\n{ROCKTAB}"
    );
    let error = load(&source, &ParseConfig::default()).expect_err("pressure decreases");
    assert_eq!(error.placeholder(), "TABLES.COLUMN_ORDER");
    assert_eq!(
        error.location().and_then(|location| location.keyword.as_deref()),
        Some("ROCKTAB")
    );
}

#[test]
fn directional_rocktab_follows_the_configured_action() {
    let source = format!("RUNSPEC\nROCKCOMP\n 'REVERS' 1 /\nPROPS\nRKTRMDIR\n{ROCKTAB}");

    let (tables, messages) = load(&source, &ParseConfig::default()).expect("warn mode");
    assert!(tables.rocktab_tables().is_empty());
    assert_eq!(messages.count(Severity::Warning), 1);

    let error = load(&source, &ParseConfig::strict()).expect_err("strict mode");
    assert_eq!(error.placeholder(), "TABLES.UNSUPPORTED_ROCKTAB_DIRECTIONAL");
}

#[test]
fn plyshlog_reads_reference_and_shear_rows() {
    let source = "
PROPS
PLYSHLOG
 1.5 /
 0.0 1.0
 1.0 0.8
 2.0 1* /
";
    let (tables, _) = load(source, &ParseConfig::default()).expect("valid deck");
    let [table] = tables.plyshlog_tables() else {
        panic!("expected exactly one PLYSHLOG table");
    };
    assert_eq!(table.ref_polymer_concentration(), 1.5);
    assert_eq!(table.ref_salinity(), None);
    assert_eq!(table.water_velocity(), &[0.0, 1.0, 2.0]);
    assert_eq!(table.shear_multiplier(), &[1.0, 0.8, 0.8]);
}

#[test]
fn multi_table_plyshlog_is_not_read() {
    let source = "
RUNSPEC
TABDIMS
 1 2 /
PROPS
PLYSHLOG
 1.5 /
 0.0 1.0 /
 2.0 /
 0.0 1.0 /
";
    let (tables, messages) = load(source, &ParseConfig::default()).expect("warn mode");
    assert!(tables.plyshlog_tables().is_empty());
    let placeholders: Vec<&str> = messages.iter().map(|message| message.placeholder).collect();
    assert_eq!(placeholders, vec!["TABLES.UNSUPPORTED_PLYSHLOG_SCHEMA"]);
}

#[test]
fn parse_config_loads_from_json() {
    let temp = tempfile::TempDir::new().expect("tempdir should be created");
    let path = temp.path().join("parse.json");
    std::fs::write(&path, r#"{ "unsupported_rocktab_directional": "ignore" }"#)
        .expect("config should be written");
    let config = ParseConfig::load(&path).expect("config should load");

    let source = format!("RUNSPEC\nROCKCOMP\n 'REVERS' 1 /\nPROPS\nRKTRMDIR\n{ROCKTAB}");
    let (tables, messages) = load(&source, &config).expect("ignored");
    assert!(tables.rocktab_tables().is_empty());
    assert!(messages.is_empty());
}
