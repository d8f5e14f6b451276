use super::tokenizer::{DeckTokenLine, RawToken, expand_repeats, tokenize_deck};
use super::{Deck, DeckItem, DeckKeyword, DeckRecord, DeckValue};
use crate::common::{MessageContainer, ParseConfig, ParseErrorKind};
use crate::domain::{EclError, ErrorLocation, ParserResult};
use crate::schema::{
    DefaultValue, ItemSchema, ItemSize, ItemType, KeywordSchema, KeywordSize, SchemaRegistry,
    Section,
};
use crate::units::UnitSystem;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct ParsedDeck {
    pub deck: Deck,
    pub messages: MessageContainer,
}

/// Builds a [`Deck`] from text using the keyword schemas of a registry.
pub struct DeckParser<'a> {
    registry: &'a SchemaRegistry,
    config: &'a ParseConfig,
}

impl<'a> DeckParser<'a> {
    pub fn new(registry: &'a SchemaRegistry, config: &'a ParseConfig) -> Self {
        Self { registry, config }
    }

    pub fn parse_file(&self, path: &Path) -> ParserResult<ParsedDeck> {
        let source = fs::read_to_string(path).map_err(|error| {
            EclError::io_system(
                "IO.DECK_READ",
                format!("failed to read deck '{}': {}", path.display(), error),
            )
        })?;
        self.parse_str(&source)
    }

    pub fn parse_str(&self, source: &str) -> ParserResult<ParsedDeck> {
        let lines = tokenize_deck(source);
        let mut deck = Deck::new();
        let mut messages = MessageContainer::new();
        let mut section: Option<Section> = None;
        let mut cursor = 0;

        while let Some(line) = lines.get(cursor) {
            cursor += 1;
            let Some(name) = line.keyword_candidate() else {
                return Err(EclError::structural(
                    "DECK.UNEXPECTED_DATA",
                    format!("data at line {} does not belong to any keyword", line.source_line),
                )
                .at(ErrorLocation::default().with_line(line.source_line)));
            };
            if line.tokens.len() > 1 {
                return Err(EclError::structural(
                    "DECK.KEYWORD_LINE",
                    format!("keyword {name} must stand alone on its line"),
                )
                .at(ErrorLocation::keyword(name).with_line(line.source_line)));
            }

            let Some(schema) = self.registry.get(&name) else {
                self.config.handle(
                    ParseErrorKind::UnknownKeyword,
                    format!("unknown keyword {} at line {}", name, line.source_line),
                    &mut messages,
                )?;
                cursor = self.skip_unknown_body(&lines, cursor);
                continue;
            };

            if let Some(marker) = Section::from_keyword(&name) {
                section = Some(marker);
            }
            if let Some(unit_system) = UnitSystem::from_keyword(&name) {
                deck.set_unit_system(unit_system);
            }
            if !schema.valid_in(section) {
                let current = section.map_or("no section", Section::as_str);
                self.config.handle(
                    ParseErrorKind::KeywordWrongSection,
                    format!(
                        "keyword {} at line {} is not valid in {}",
                        name, line.source_line, current
                    ),
                    &mut messages,
                )?;
            }

            let (records, next) = self.read_records(schema, &lines, cursor, &deck, line.source_line)?;
            cursor = next;
            deck.push(DeckKeyword::new(name.clone(), line.source_line, section, records));

            if name == "END" {
                break;
            }
        }

        tracing::debug!(keywords = deck.len(), "deck parsed");
        Ok(ParsedDeck { deck, messages })
    }

    fn starts_known_keyword(&self, line: &DeckTokenLine) -> bool {
        line.keyword_candidate()
            .is_some_and(|name| self.registry.contains(&name))
    }

    fn skip_unknown_body(&self, lines: &[DeckTokenLine], mut cursor: usize) -> usize {
        while let Some(line) = lines.get(cursor) {
            if self.starts_known_keyword(line) {
                break;
            }
            cursor += 1;
        }
        cursor
    }

    fn read_records(
        &self,
        schema: &KeywordSchema,
        lines: &[DeckTokenLine],
        mut cursor: usize,
        deck: &Deck,
        keyword_line: usize,
    ) -> ParserResult<(Vec<DeckRecord>, usize)> {
        let target = match &schema.size {
            KeywordSize::None => return Ok((Vec::new(), cursor)),
            KeywordSize::Fixed(count) => Some(*count),
            KeywordSize::SlashTerminated => None,
            KeywordSize::Table {
                keyword,
                item,
                default,
                records_per_table,
            } => Some(table_count(deck, keyword, item, *default)? * records_per_table),
        };

        let mut records = Vec::new();
        let mut pending: Vec<RawToken> = Vec::new();
        let mut record_line: Option<usize> = None;

        while target != Some(records.len()) {
            let Some(line) = lines.get(cursor) else {
                if pending.is_empty() && target.is_none() {
                    break;
                }
                return Err(EclError::structural(
                    "DECK.UNTERMINATED_KEYWORD",
                    format!(
                        "keyword {} ended after {} records",
                        schema.name,
                        records.len()
                    ),
                )
                .at(ErrorLocation::keyword(schema.name).with_line(keyword_line)));
            };
            if pending.is_empty() && target.is_none() && self.starts_known_keyword(line) {
                break;
            }

            cursor += 1;
            record_line.get_or_insert(line.source_line);
            let terminated = matches!(line.tokens.last(), Some(RawToken::Slash));
            pending.extend(
                line.tokens
                    .iter()
                    .filter(|token| !matches!(token, RawToken::Slash))
                    .cloned(),
            );
            if !terminated {
                continue;
            }

            let tokens = std::mem::take(&mut pending);
            let line_number = record_line.take().unwrap_or(keyword_line);
            if tokens.is_empty() && target.is_none() {
                break;
            }
            records.push(build_record(schema, records.len(), &tokens, line_number)?);
        }

        Ok((records, cursor))
    }
}

fn table_count(deck: &Deck, keyword: &str, item: &str, default: usize) -> ParserResult<usize> {
    let Some(sizing) = deck.last_keyword(keyword) else {
        return Ok(default);
    };
    let record = sizing.record(0)?;
    let item = record.item(item)?;
    if !item.has_value(0) {
        return Ok(default);
    }
    let count = item.get_int(0)?;
    usize::try_from(count).map_err(|_| {
        EclError::structural(
            "DECK.INVALID_TABLE_COUNT",
            format!("{} item {} must not be negative, got {}", keyword, item.name(), count),
        )
        .at(sizing.location())
    })
}

fn build_record(
    schema: &KeywordSchema,
    record_index: usize,
    tokens: &[RawToken],
    line: usize,
) -> ParserResult<DeckRecord> {
    let location = ErrorLocation::keyword(schema.name)
        .with_line(line)
        .with_record(record_index);
    let slots = expand_repeats(tokens)
        .map_err(|message| EclError::structural("DECK.INVALID_REPEAT", message).at(location.clone()))?;

    let item_schemas = schema.record_items(record_index);
    let mut slots = slots.into_iter();
    let mut items = Vec::with_capacity(item_schemas.len());
    for item_schema in item_schemas {
        let mut item = DeckItem::new(item_schema.name, item_schema.item_type, item_schema.dimension);
        match item_schema.size {
            ItemSize::Single => push_slot(&mut item, item_schema, slots.next().flatten(), &location)?,
            ItemSize::All => {
                for slot in slots.by_ref() {
                    push_slot(&mut item, item_schema, slot, &location)?;
                }
            }
        }
        items.push(item);
    }

    let leftover = slots.count();
    if leftover > 0 {
        return Err(EclError::structural(
            "DECK.TOO_MANY_ITEMS",
            format!(
                "record holds {} values beyond the {} items of {}",
                leftover,
                item_schemas.len(),
                schema.name
            ),
        )
        .at(location));
    }
    Ok(DeckRecord::new(items))
}

fn push_slot(
    item: &mut DeckItem,
    schema: &ItemSchema,
    slot: Option<String>,
    location: &ErrorLocation,
) -> ParserResult<()> {
    match slot {
        Some(text) => {
            let value = parse_value(schema.item_type, &text).ok_or_else(|| {
                EclError::structural(
                    "DECK.INVALID_ITEM_VALUE",
                    format!("cannot convert '{}' to {}", text, schema.item_type.as_str()),
                )
                .at(location.clone().with_item(schema.name))
            })?;
            item.push_value(value);
        }
        None => item.push_default(schema.default.as_ref().map(default_value)),
    }
    Ok(())
}

fn default_value(default: &DefaultValue) -> DeckValue {
    match default {
        DefaultValue::Int(value) => DeckValue::Int(*value),
        DefaultValue::Double(value) => DeckValue::Double(*value),
        DefaultValue::Str(value) => DeckValue::Str((*value).to_string()),
    }
}

fn parse_value(item_type: ItemType, text: &str) -> Option<DeckValue> {
    match item_type {
        ItemType::Int => text.parse::<i32>().ok().map(DeckValue::Int),
        ItemType::Double => parse_f64(text).map(DeckValue::Double),
        ItemType::String | ItemType::RawString => Some(DeckValue::Str(text.to_string())),
    }
}

/// Accepts Fortran `D` exponents as well as the usual `E` form.
pub(crate) fn parse_f64(text: &str) -> Option<f64> {
    text.parse::<f64>()
        .ok()
        .or_else(|| text.replace(['D', 'd'], "E").parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::{DeckParser, parse_f64};
    use crate::common::{MessageContainer, ParseConfig, Severity};
    use crate::domain::EclErrorCategory;
    use crate::schema::{SchemaRegistry, Section};
    use crate::units::UnitSystem;

    fn parse(source: &str) -> (crate::deck::Deck, MessageContainer) {
        let registry = SchemaRegistry::builtin();
        let config = ParseConfig::default();
        let parsed = DeckParser::new(&registry, &config)
            .parse_str(source)
            .expect("deck should parse");
        (parsed.deck, parsed.messages)
    }

    #[test]
    fn parser_fills_defaults_and_expands_repeats() {
        let (deck, _) = parse(
            "SCHEDULE\nWCONPROD\n  'OP1' 'OPEN' 'ORAT' 1000 4* 150 /\n/\n",
        );

        let keyword = deck.last_keyword("WCONPROD").expect("WCONPROD should parse");
        assert_eq!(keyword.len(), 1);
        assert_eq!(keyword.section(), Some(Section::Schedule));
        let record = keyword.record(0).expect("record should exist");

        let orat = record.item("ORAT").expect("ORAT should exist");
        assert_eq!(orat.get_double(0).expect("ORAT value"), 1000.0);
        assert!(!orat.default_applied(0));

        let wrat = record.item("WRAT").expect("WRAT should exist");
        assert!(wrat.default_applied(0));
        assert_eq!(wrat.get_double(0).expect("WRAT default"), 0.0);

        let bhp = record.item("BHP").expect("BHP should exist");
        assert_eq!(bhp.get_double(0).expect("BHP value"), 150.0);
        let thp = record.item("THP").expect("THP should exist");
        assert!(thp.default_applied(0));
    }

    #[test]
    fn slash_terminated_keyword_may_end_at_next_keyword() {
        let (deck, _) = parse("SCHEDULE\nGRUPTREE\n 'G1' 'FIELD' /\nTSTEP\n 1 2 /\n");

        assert_eq!(deck.count("GRUPTREE"), 1);
        let tstep = deck.last_keyword("TSTEP").expect("TSTEP should parse");
        let steps = tstep
            .record(0)
            .and_then(|record| record.item("step_list").map(|item| item.len()))
            .expect("step list should exist");
        assert_eq!(steps, 2);
    }

    #[test]
    fn records_may_span_several_lines() {
        let (deck, _) = parse("SCHEDULE\nTSTEP\n 1 2\n 3*10\n/\n");
        let item_len = deck
            .last_keyword("TSTEP")
            .and_then(|keyword| keyword.records().first())
            .and_then(|record| record.item_at(0))
            .map(|item| item.len());
        assert_eq!(item_len, Some(5));
    }

    #[test]
    fn table_sized_keyword_reads_count_from_earlier_keyword() {
        let (deck, _) = parse(
            "RUNSPEC\nROCKCOMP\n 'REVERS' 2 /\nPROPS\nROCKTAB\n 100 1.0 1.0\n 200 1.1 1.1 /\n 100 1.0 1.0 /\n",
        );
        let rocktab = deck.last_keyword("ROCKTAB").expect("ROCKTAB should parse");
        assert_eq!(rocktab.len(), 2);
    }

    #[test]
    fn unknown_keyword_warns_and_skips_body() {
        let (deck, messages) = parse("SUMMARY\nFOPR\nWOPR\n 'OP1' /\nSCHEDULE\nTSTEP\n 1 /\n");

        assert!(!deck.has_keyword("FOPR"));
        assert!(!deck.has_keyword("WOPR"));
        assert!(deck.has_keyword("TSTEP"));
        assert_eq!(messages.count(Severity::Warning), 1);
    }

    #[test]
    fn unknown_keyword_fails_under_strict_config() {
        let registry = SchemaRegistry::builtin();
        let config = ParseConfig::strict();
        let error = DeckParser::new(&registry, &config)
            .parse_str("GRID\nFOOBAR\n 1 2 3 /\n")
            .expect_err("strict parse should fail");
        assert_eq!(error.category(), EclErrorCategory::StructuralFormatError);
        assert_eq!(error.placeholder(), "DECK.UNKNOWN_KEYWORD");
    }

    #[test]
    fn keyword_in_wrong_section_is_kept_with_warning() {
        let (deck, messages) = parse("PROPS\nTSTEP\n 1 /\n");
        assert!(deck.has_keyword("TSTEP"));
        assert_eq!(messages.with_placeholder("DECK.KEYWORD_WRONG_SECTION").count(), 1);
    }

    #[test]
    fn too_many_items_is_structural_error() {
        let registry = SchemaRegistry::builtin();
        let config = ParseConfig::default();
        let error = DeckParser::new(&registry, &config)
            .parse_str("SCHEDULE\nGRUPTREE\n 'A' 'B' 'C' /\n/\n")
            .expect_err("extra item should fail");
        assert_eq!(error.placeholder(), "DECK.TOO_MANY_ITEMS");
        let location = error.location().expect("location should be attached");
        assert_eq!(location.keyword.as_deref(), Some("GRUPTREE"));
        assert_eq!(location.line, Some(3));
    }

    #[test]
    fn bad_integer_reports_item_location() {
        let registry = SchemaRegistry::builtin();
        let config = ParseConfig::default();
        let error = DeckParser::new(&registry, &config)
            .parse_str("SCHEDULE\nWELSPECS\n 'OP1' 'G1' x 3 /\n/\n")
            .expect_err("bad integer should fail");
        assert_eq!(error.placeholder(), "DECK.INVALID_ITEM_VALUE");
        assert_eq!(
            error.location().and_then(|location| location.item.as_deref()),
            Some("HEAD_I")
        );
    }

    #[test]
    fn unit_marker_sets_deck_unit_system() {
        let (deck, _) = parse("RUNSPEC\nFIELD\nSCHEDULE\n");
        assert_eq!(deck.unit_system(), UnitSystem::Field);
    }

    #[test]
    fn fortran_exponent_is_accepted() {
        assert_eq!(parse_f64("1.5D2"), Some(150.0));
        assert_eq!(parse_f64("2.0e-1"), Some(0.2));
        assert_eq!(parse_f64("abc"), None);
    }
}
