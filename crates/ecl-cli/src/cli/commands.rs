use super::CliError;
use super::helpers::*;
use ecl_core::common::ParseConfig;
use ecl_core::domain::EclError;
use ecl_core::schedule::Schedule;
use ecl_core::summary::classify;
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(clap::Args)]
pub(super) struct KeysArgs {
    /// Summary header (SMSPEC or FSMSPEC)
    #[arg(value_name = "SMSPEC")]
    header: PathBuf,

    /// Shell glob over general keys; TIME is left out when omitted or `*`
    #[arg(long)]
    pattern: Option<String>,

    /// Key to leave out of the listing; may be repeated
    #[arg(long = "exclude", value_name = "KEY")]
    exclude: Vec<String>,
}

#[derive(clap::Args)]
pub(super) struct LookupArgs {
    /// Summary header (SMSPEC or FSMSPEC)
    #[arg(value_name = "SMSPEC")]
    header: PathBuf,

    /// General key, for example WOPR:OP1 or BPR:3,4,5
    #[arg(value_name = "KEY")]
    key: String,
}

#[derive(clap::Args)]
pub(super) struct MapArgs {
    /// Header whose columns are mapped
    #[arg(value_name = "SMSPEC")]
    header: PathBuf,

    /// Header the columns are looked up in
    #[arg(value_name = "OTHER")]
    other: PathBuf,
}

#[derive(clap::Args)]
pub(super) struct ClassifyArgs {
    /// Summary mnemonics such as WOPR or RNLF
    #[arg(value_name = "MNEMONIC", required = true)]
    mnemonics: Vec<String>,
}

#[derive(clap::Args)]
pub(super) struct ScheduleArgs {
    /// Input deck
    #[arg(value_name = "DECK")]
    deck: PathBuf,

    /// JSON parse configuration
    #[arg(long, value_name = "FILE", conflicts_with = "strict")]
    config: Option<PathBuf>,

    /// Treat every recoverable input problem as an error
    #[arg(long)]
    strict: bool,
}

pub(super) fn run_keys_command(args: KeysArgs) -> Result<i32, CliError> {
    let spec = load_summary_spec(&args.header)?;
    let exclude: HashSet<String> = args.exclude.into_iter().collect();
    for key in spec.select_matching(args.pattern.as_deref(), &exclude)? {
        println!("{key}");
    }
    Ok(0)
}

pub(super) fn run_lookup_command(args: LookupArgs) -> Result<i32, CliError> {
    let spec = load_summary_spec(&args.header)?;
    let node = spec.lookup_general(&args.key).ok_or_else(|| {
        CliError::Compute(EclError::invalid_input(
            "SMSPEC.UNKNOWN_KEY",
            format!(
                "summary key '{}' does not exist in '{}'",
                args.key,
                args.header.display()
            ),
        ))
    })?;
    print_json(node)?;
    Ok(0)
}

pub(super) fn run_map_command(args: MapArgs) -> Result<i32, CliError> {
    let spec = load_summary_spec(&args.header)?;
    let other = load_summary_spec(&args.other)?;
    print_json(&spec.compute_mapping(&other))?;
    Ok(0)
}

pub(super) fn run_classify_command(args: ClassifyArgs) -> Result<i32, CliError> {
    for mnemonic in &args.mnemonics {
        println!("{mnemonic} {}", classify(mnemonic).as_str());
    }
    Ok(0)
}

pub(super) fn run_schedule_command(args: ScheduleArgs) -> Result<i32, CliError> {
    let config = match (&args.config, args.strict) {
        (Some(path), _) => ParseConfig::load(path)?,
        (None, true) => ParseConfig::strict(),
        (None, false) => ParseConfig::default(),
    };
    let parsed = parse_deck(&args.deck, &config)?;
    let schedule = Schedule::new(&parsed.deck, &config)?;
    print_json(&ScheduleReport::new(&schedule, &parsed.messages))?;
    Ok(0)
}
