//! Keyword schemas for the deck grammar.
//!
//! A [`KeywordSchema`] tells the record builder how many records a keyword
//! carries and how the tokens of each record map onto named, typed items.
//! The registry is built once and handed to the parser by reference.

mod builtin;

pub use builtin::UNSUPPORTED_GEO_MODIFIERS;

use serde::Serialize;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Section {
    Runspec,
    Grid,
    Edit,
    Props,
    Regions,
    Solution,
    Summary,
    Schedule,
}

impl Section {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "RUNSPEC" => Some(Self::Runspec),
            "GRID" => Some(Self::Grid),
            "EDIT" => Some(Self::Edit),
            "PROPS" => Some(Self::Props),
            "REGIONS" => Some(Self::Regions),
            "SOLUTION" => Some(Self::Solution),
            "SUMMARY" => Some(Self::Summary),
            "SCHEDULE" => Some(Self::Schedule),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Runspec => "RUNSPEC",
            Self::Grid => "GRID",
            Self::Edit => "EDIT",
            Self::Props => "PROPS",
            Self::Regions => "REGIONS",
            Self::Solution => "SOLUTION",
            Self::Summary => "SUMMARY",
            Self::Schedule => "SCHEDULE",
        }
    }
}

impl Display for Section {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    Int,
    Double,
    String,
    RawString,
}

impl ItemType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Int => "INT",
            Self::Double => "DOUBLE",
            Self::String => "STRING",
            Self::RawString => "RAW_STRING",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Int(i32),
    Double(f64),
    Str(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemSize {
    Single,
    /// Consumes every remaining token of the record.
    All,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemSchema {
    pub name: &'static str,
    pub item_type: ItemType,
    pub default: Option<DefaultValue>,
    pub dimension: Option<&'static str>,
    pub size: ItemSize,
}

impl ItemSchema {
    fn new(name: &'static str, item_type: ItemType) -> Self {
        Self {
            name,
            item_type,
            default: None,
            dimension: None,
            size: ItemSize::Single,
        }
    }

    pub fn int(name: &'static str) -> Self {
        Self::new(name, ItemType::Int)
    }

    pub fn double(name: &'static str) -> Self {
        Self::new(name, ItemType::Double)
    }

    pub fn string(name: &'static str) -> Self {
        Self::new(name, ItemType::String)
    }

    pub fn raw_string(name: &'static str) -> Self {
        Self::new(name, ItemType::RawString)
    }

    pub fn default_int(mut self, value: i32) -> Self {
        self.default = Some(DefaultValue::Int(value));
        self
    }

    pub fn default_double(mut self, value: f64) -> Self {
        self.default = Some(DefaultValue::Double(value));
        self
    }

    pub fn default_str(mut self, value: &'static str) -> Self {
        self.default = Some(DefaultValue::Str(value));
        self
    }

    pub fn dimension(mut self, dimension: &'static str) -> Self {
        self.dimension = Some(dimension);
        self
    }

    pub fn all(mut self) -> Self {
        self.size = ItemSize::All;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeywordSize {
    /// Keyword line only.
    None,
    Fixed(usize),
    /// Records until an empty record.
    SlashTerminated,
    /// Record count taken from an item of a previously parsed keyword.
    Table {
        keyword: &'static str,
        item: &'static str,
        default: usize,
        records_per_table: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordSchema {
    pub name: &'static str,
    pub sections: &'static [Section],
    pub size: KeywordSize,
    /// Layout of record 0 when it differs from the body records.
    pub header: Option<Vec<ItemSchema>>,
    /// Body record `i` is laid out by `records[i % records.len()]`.
    pub records: Vec<Vec<ItemSchema>>,
}

impl KeywordSchema {
    pub fn new(name: &'static str, size: KeywordSize) -> Self {
        Self {
            name,
            sections: &[],
            size,
            header: None,
            records: Vec::new(),
        }
    }

    pub fn in_sections(mut self, sections: &'static [Section]) -> Self {
        self.sections = sections;
        self
    }

    pub fn items(mut self, items: Vec<ItemSchema>) -> Self {
        self.records.push(items);
        self
    }

    /// Sets a distinct layout for the first record, as in WELSEGS.
    pub fn header_items(mut self, items: Vec<ItemSchema>) -> Self {
        self.header = Some(items);
        self
    }

    pub fn record_items(&self, record_index: usize) -> &[ItemSchema] {
        let body_index = match &self.header {
            Some(header) if record_index == 0 => return header,
            Some(_) => record_index - 1,
            None => record_index,
        };
        if self.records.is_empty() {
            return &[];
        }
        &self.records[body_index % self.records.len()]
    }

    /// Position of `name` in the first record.
    pub fn item_index(&self, name: &str) -> Option<usize> {
        self.record_items(0)
            .iter()
            .position(|item| item.name == name)
    }

    pub fn valid_in(&self, section: Option<Section>) -> bool {
        match section {
            _ if self.sections.is_empty() => true,
            Some(section) => self.sections.contains(&section),
            None => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    keywords: HashMap<&'static str, KeywordSchema>,
}

impl SchemaRegistry {
    pub fn builtin() -> Self {
        let mut keywords = HashMap::new();
        for schema in builtin::keywords() {
            keywords.insert(schema.name, schema);
        }
        Self { keywords }
    }

    pub fn empty() -> Self {
        Self {
            keywords: HashMap::new(),
        }
    }

    pub fn register(&mut self, schema: KeywordSchema) {
        self.keywords.insert(schema.name, schema);
    }

    pub fn get(&self, name: &str) -> Option<&KeywordSchema> {
        self.keywords.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.keywords.contains_key(name)
    }

    pub fn keyword_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.keywords.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::{DefaultValue, ItemSize, KeywordSize, SchemaRegistry, Section};

    #[test]
    fn builtin_registry_knows_schedule_keywords() {
        let registry = SchemaRegistry::builtin();
        for name in [
            "DATES", "TSTEP", "WELSPECS", "COMPDAT", "WCONPROD", "WCONHIST", "WCONINJE",
            "WELOPEN", "WELTARG", "GRUPTREE", "MULTFLT", "ROCKTAB", "NOSIM",
        ] {
            assert!(registry.contains(name), "{name} should be registered");
        }
        assert!(!registry.contains("WOPR"));
    }

    #[test]
    fn wconprod_defaults_follow_keyword_definition() {
        let registry = SchemaRegistry::builtin();
        let schema = registry.get("WCONPROD").expect("WCONPROD should exist");
        let bhp = schema
            .record_items(0)
            .iter()
            .find(|item| item.name == "BHP")
            .expect("BHP item should exist");

        assert_eq!(bhp.default, Some(DefaultValue::Double(1.01325)));
        assert_eq!(bhp.dimension, Some("Pressure"));
        assert_eq!(schema.size, KeywordSize::SlashTerminated);
        assert_eq!(schema.item_index("CMODE"), Some(2));
    }

    #[test]
    fn plyshlog_alternates_record_layouts() {
        let registry = SchemaRegistry::builtin();
        let schema = registry.get("PLYSHLOG").expect("PLYSHLOG should exist");

        assert_eq!(schema.record_items(0)[0].name, "REF_POLYMER_CONCENTRATION");
        assert_eq!(schema.record_items(1)[0].size, ItemSize::All);
        assert_eq!(schema.record_items(2)[0].name, "REF_POLYMER_CONCENTRATION");
    }

    #[test]
    fn header_record_is_laid_out_once() {
        let registry = SchemaRegistry::builtin();
        let schema = registry.get("WELSEGS").expect("WELSEGS should exist");

        assert_eq!(schema.record_items(0)[0].name, "WELL");
        assert_eq!(schema.record_items(1)[0].name, "SEGMENT1");
        assert_eq!(schema.record_items(7)[0].name, "SEGMENT1");
        assert_eq!(schema.item_index("INFO_TYPE"), Some(4));
    }

    #[test]
    fn tuning_has_three_fixed_records() {
        let registry = SchemaRegistry::builtin();
        let schema = registry.get("TUNING").expect("TUNING should exist");

        assert_eq!(schema.size, KeywordSize::Fixed(3));
        assert_eq!(schema.record_items(0)[0].dimension, Some("Time"));
        assert_eq!(schema.record_items(2)[0].name, "NEWTMX");
    }

    #[test]
    fn section_validity_defaults_to_anywhere() {
        let registry = SchemaRegistry::builtin();
        let end = registry.get("END").expect("END should exist");
        let dates = registry.get("DATES").expect("DATES should exist");

        assert!(end.valid_in(Some(Section::Grid)));
        assert!(dates.valid_in(Some(Section::Schedule)));
        assert!(!dates.valid_in(Some(Section::Props)));
    }
}
