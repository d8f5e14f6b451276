mod parser;
pub mod tokenizer;

pub use parser::{DeckParser, ParsedDeck};

use crate::domain::{EclError, EclResult, ErrorLocation};
use crate::schema::{ItemType, Section};
use crate::units::UnitSystem;

#[derive(Debug, Clone, PartialEq)]
pub enum DeckValue {
    Int(i32),
    Double(f64),
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeckItem {
    name: &'static str,
    item_type: ItemType,
    dimension: Option<&'static str>,
    values: Vec<Option<DeckValue>>,
    defaulted: Vec<bool>,
}

impl DeckItem {
    pub fn new(name: &'static str, item_type: ItemType, dimension: Option<&'static str>) -> Self {
        Self {
            name,
            item_type,
            dimension,
            values: Vec::new(),
            defaulted: Vec::new(),
        }
    }

    pub fn push_value(&mut self, value: DeckValue) {
        self.values.push(Some(value));
        self.defaulted.push(false);
    }

    /// Records a defaulted slot, holding the schema default when there is one.
    pub fn push_default(&mut self, default: Option<DeckValue>) {
        self.values.push(default);
        self.defaulted.push(true);
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    pub fn dimension(&self) -> Option<&'static str> {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn has_value(&self, index: usize) -> bool {
        matches!(self.values.get(index), Some(Some(_)))
    }

    pub fn default_applied(&self, index: usize) -> bool {
        self.defaulted.get(index).copied().unwrap_or(true)
    }

    fn value(&self, index: usize) -> EclResult<&DeckValue> {
        self.values
            .get(index)
            .and_then(Option::as_ref)
            .ok_or_else(|| {
                EclError::invalid_input(
                    "DECK.MISSING_VALUE",
                    format!("item {} has no value at index {}", self.name, index),
                )
                .at(ErrorLocation::default().with_item(self.name))
            })
    }

    fn type_mismatch(&self, expected: &str) -> EclError {
        EclError::internal(
            "DECK.ITEM_TYPE",
            format!(
                "item {} is {} and cannot be read as {}",
                self.name,
                self.item_type.as_str(),
                expected
            ),
        )
    }

    pub fn get_int(&self, index: usize) -> EclResult<i32> {
        match self.value(index)? {
            DeckValue::Int(value) => Ok(*value),
            _ => Err(self.type_mismatch("INT")),
        }
    }

    pub fn get_double(&self, index: usize) -> EclResult<f64> {
        match self.value(index)? {
            DeckValue::Double(value) => Ok(*value),
            DeckValue::Int(value) => Ok(f64::from(*value)),
            DeckValue::Str(_) => Err(self.type_mismatch("DOUBLE")),
        }
    }

    pub fn get_string(&self, index: usize) -> EclResult<&str> {
        match self.value(index)? {
            DeckValue::Str(value) => Ok(value.trim()),
            _ => Err(self.type_mismatch("STRING")),
        }
    }

    pub fn get_si_double(&self, index: usize, units: UnitSystem) -> EclResult<f64> {
        let raw = self.get_double(index)?;
        Ok(match self.dimension {
            Some(dimension) => units.to_si(dimension, raw),
            None => raw,
        })
    }

    /// All slots of a multi-valued item; defaulted slots without a default are `None`.
    pub fn double_values(&self) -> EclResult<Vec<Option<f64>>> {
        (0..self.len())
            .map(|index| {
                if self.has_value(index) {
                    self.get_double(index).map(Some)
                } else {
                    Ok(None)
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeckRecord {
    items: Vec<DeckItem>,
}

impl DeckRecord {
    pub fn new(items: Vec<DeckItem>) -> Self {
        Self { items }
    }

    pub fn item(&self, name: &str) -> EclResult<&DeckItem> {
        self.items
            .iter()
            .find(|item| item.name == name)
            .ok_or_else(|| {
                EclError::internal(
                    "DECK.UNKNOWN_ITEM",
                    format!("record has no item named {name}"),
                )
            })
    }

    pub fn item_at(&self, index: usize) -> Option<&DeckItem> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[DeckItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeckKeyword {
    name: String,
    line: usize,
    section: Option<Section>,
    records: Vec<DeckRecord>,
}

impl DeckKeyword {
    pub fn new(
        name: impl Into<String>,
        line: usize,
        section: Option<Section>,
        records: Vec<DeckRecord>,
    ) -> Self {
        Self {
            name: name.into(),
            line,
            section,
            records,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn section(&self) -> Option<Section> {
        self.section
    }

    pub fn records(&self) -> &[DeckRecord] {
        &self.records
    }

    pub fn record(&self, index: usize) -> EclResult<&DeckRecord> {
        self.records.get(index).ok_or_else(|| {
            EclError::structural(
                "DECK.MISSING_RECORD",
                format!("keyword {} has no record {}", self.name, index),
            )
            .at(self.location())
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn location(&self) -> ErrorLocation {
        ErrorLocation::keyword(self.name.clone()).with_line(self.line)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Deck {
    keywords: Vec<DeckKeyword>,
    unit_system: UnitSystem,
}

impl Deck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unit_system(unit_system: UnitSystem) -> Self {
        Self {
            keywords: Vec::new(),
            unit_system,
        }
    }

    pub fn push(&mut self, keyword: DeckKeyword) {
        self.keywords.push(keyword);
    }

    pub fn keywords(&self) -> &[DeckKeyword] {
        &self.keywords
    }

    pub fn has_keyword(&self, name: &str) -> bool {
        self.keywords.iter().any(|keyword| keyword.name == name)
    }

    pub fn count(&self, name: &str) -> usize {
        self.keywords_named(name).count()
    }

    pub fn keywords_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a DeckKeyword> {
        self.keywords.iter().filter(move |keyword| keyword.name == name)
    }

    pub fn last_keyword(&self, name: &str) -> Option<&DeckKeyword> {
        self.keywords.iter().rev().find(|keyword| keyword.name == name)
    }

    pub fn section_keywords(&self, section: Section) -> impl Iterator<Item = &DeckKeyword> {
        self.keywords
            .iter()
            .filter(move |keyword| keyword.section == Some(section))
    }

    pub fn unit_system(&self) -> UnitSystem {
        self.unit_system
    }

    pub fn set_unit_system(&mut self, unit_system: UnitSystem) {
        self.unit_system = unit_system;
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}
