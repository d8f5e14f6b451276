use super::CliError;
use anyhow::Context;
use ecl_core::common::{Message, MessageContainer, ParseConfig};
use ecl_core::deck::{DeckParser, ParsedDeck};
use ecl_core::schedule::{Schedule, WellStatus};
use ecl_core::schema::SchemaRegistry;
use ecl_core::summary::SummarySpec;
use serde::Serialize;
use std::path::Path;

pub(super) fn load_summary_spec(path: &Path) -> Result<SummarySpec, CliError> {
    let spec = SummarySpec::open(path)?;
    tracing::debug!(
        path = %path.display(),
        columns = spec.params_size(),
        "summary header loaded"
    );
    Ok(spec)
}

pub(super) fn parse_deck(path: &Path, config: &ParseConfig) -> Result<ParsedDeck, CliError> {
    let registry = SchemaRegistry::builtin();
    Ok(DeckParser::new(&registry, config).parse_file(path)?)
}

pub(super) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered =
        serde_json::to_string_pretty(value).context("failed to render JSON output")?;
    println!("{rendered}");
    Ok(())
}

#[derive(Debug, Serialize)]
pub(super) struct ScheduleReport<'a> {
    start: String,
    num_timesteps: usize,
    steps: Vec<StepReport>,
    wells: Vec<WellReport<'a>>,
    groups: Vec<&'a str>,
    messages: Vec<&'a Message>,
}

#[derive(Debug, Serialize)]
struct StepReport {
    step: usize,
    time: String,
    events: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
struct WellReport<'a> {
    name: &'a str,
    group: Option<&'a str>,
    created_at: usize,
    status: Vec<WellStatus>,
    completions: usize,
}

impl<'a> ScheduleReport<'a> {
    /// Deck messages come first, followed by those raised while building the schedule.
    pub(super) fn new(schedule: &'a Schedule, deck_messages: &'a MessageContainer) -> Self {
        let last_step = schedule.num_timesteps();
        let steps = (0..=last_step)
            .map(|step| StepReport {
                step,
                time: schedule
                    .time_map()
                    .time(step)
                    .map(|time| time.to_string())
                    .unwrap_or_default(),
                events: schedule.events().names_at(step),
            })
            .collect();
        let wells = schedule
            .wells()
            .iter()
            .map(|well| WellReport {
                name: well.name(),
                group: well.group_name(last_step),
                created_at: well.creation_step(),
                status: (0..=last_step).map(|step| well.status(step)).collect(),
                completions: well.completions(last_step).len(),
            })
            .collect();

        Self {
            start: schedule.start_time().to_string(),
            num_timesteps: last_step,
            steps,
            wells,
            groups: schedule.groups().iter().map(|group| group.name()).collect(),
            messages: deck_messages
                .iter()
                .chain(schedule.messages().iter())
                .collect(),
        }
    }
}
