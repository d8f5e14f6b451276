//! Rock compaction and polymer shear tables from the PROPS section.
//!
//! Table keywords carry one flat DATA item per table, read row by row. The
//! first column is the lookup argument and may not be defaulted; defaulted
//! entries in the other columns are interpolated linearly against it.

use crate::common::{MessageContainer, ParseConfig, ParseErrorKind};
use crate::deck::{Deck, DeckKeyword, DeckRecord};
use crate::domain::{EclError, EclResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnOrder {
    Random,
    StrictlyIncreasing,
    StrictlyDecreasing,
}

impl ColumnOrder {
    fn holds(self, values: &[f64]) -> bool {
        match self {
            Self::Random => true,
            Self::StrictlyIncreasing => values.windows(2).all(|pair| pair[0] < pair[1]),
            Self::StrictlyDecreasing => values.windows(2).all(|pair| pair[0] > pair[1]),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimpleTable {
    names: Vec<&'static str>,
    columns: Vec<Vec<f64>>,
}

impl SimpleTable {
    /// Splits the row-major `values` into columns described by `schema`.
    pub fn from_values(
        keyword: &str,
        values: &[Option<f64>],
        schema: &[(&'static str, ColumnOrder)],
    ) -> EclResult<Self> {
        let width = schema.len();
        if values.is_empty() || values.len() % width != 0 {
            return Err(EclError::structural(
                "TABLES.COLUMN_COUNT",
                format!(
                    "{keyword} table has {} values, expected a positive multiple of {width}",
                    values.len()
                ),
            ));
        }

        let argument = values
            .iter()
            .step_by(width)
            .map(|value| {
                value.ok_or_else(|| {
                    EclError::structural(
                        "TABLES.DEFAULTED_ARGUMENT",
                        format!("{keyword} column {} cannot be defaulted", schema[0].0),
                    )
                })
            })
            .collect::<EclResult<Vec<f64>>>()?;

        let mut columns = vec![argument];
        for column in 1..width {
            let raw: Vec<Option<f64>> = values
                .iter()
                .skip(column)
                .step_by(width)
                .copied()
                .collect();
            columns.push(fill_defaults(keyword, schema[column].0, &columns[0], &raw)?);
        }

        for ((name, order), column) in schema.iter().zip(&columns) {
            if !order.holds(column) {
                return Err(EclError::structural(
                    "TABLES.COLUMN_ORDER",
                    format!("{keyword} column {name} must be {order:?}"),
                ));
            }
        }

        Ok(Self {
            names: schema.iter().map(|(name, _)| *name).collect(),
            columns,
        })
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn column_names(&self) -> &[&'static str] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|candidate| *candidate == name)
            .map(|index| self.columns[index].as_slice())
    }
}

fn fill_defaults(
    keyword: &str,
    name: &str,
    argument: &[f64],
    raw: &[Option<f64>],
) -> EclResult<Vec<f64>> {
    let known: Vec<usize> = (0..raw.len()).filter(|row| raw[*row].is_some()).collect();
    if known.is_empty() {
        return Err(EclError::structural(
            "TABLES.ALL_DEFAULTED",
            format!("{keyword} column {name} has no values"),
        ));
    }

    let value_at = |row: usize| raw[row].unwrap_or_default();
    Ok((0..raw.len())
        .map(|row| {
            if let Some(value) = raw[row] {
                return value;
            }
            let below = known.iter().rev().find(|known_row| **known_row < row);
            let above = known.iter().find(|known_row| **known_row > row);
            match (below, above) {
                (Some(&lo), Some(&hi)) => {
                    let weight = (argument[row] - argument[lo]) / (argument[hi] - argument[lo]);
                    value_at(lo) + weight * (value_at(hi) - value_at(lo))
                }
                (Some(&nearest), None) | (None, Some(&nearest)) => value_at(nearest),
                (None, None) => 0.0,
            }
        })
        .collect())
}

fn data_values(record: &DeckRecord) -> EclResult<Vec<Option<f64>>> {
    record.item("DATA")?.double_values()
}

/// Pore volume and transmissibility multipliers against pressure.
#[derive(Debug, Clone, PartialEq)]
pub struct RocktabTable {
    table: SimpleTable,
}

impl RocktabTable {
    pub fn new(record: &DeckRecord, stress_option: bool) -> EclResult<Self> {
        let pressure_order = if stress_option {
            ColumnOrder::StrictlyIncreasing
        } else {
            ColumnOrder::StrictlyDecreasing
        };
        let table = SimpleTable::from_values(
            "ROCKTAB",
            &data_values(record)?,
            &[
                ("PO", pressure_order),
                ("PV_MULT", ColumnOrder::Random),
                ("PV_MULT_TRAN", ColumnOrder::Random),
            ],
        )?;
        Ok(Self { table })
    }

    pub fn table(&self) -> &SimpleTable {
        &self.table
    }

    pub fn pressure(&self) -> &[f64] {
        self.table.column("PO").unwrap_or_default()
    }

    pub fn pore_volume_multiplier(&self) -> &[f64] {
        self.table.column("PV_MULT").unwrap_or_default()
    }

    pub fn transmissibility_multiplier(&self) -> &[f64] {
        self.table.column("PV_MULT_TRAN").unwrap_or_default()
    }
}

/// Shear thinning multipliers against water velocity.
#[derive(Debug, Clone, PartialEq)]
pub struct PlyshlogTable {
    ref_polymer_concentration: f64,
    ref_salinity: Option<f64>,
    ref_temperature: Option<f64>,
    table: SimpleTable,
}

impl PlyshlogTable {
    pub fn new(reference: &DeckRecord, data: &DeckRecord) -> EclResult<Self> {
        let optional = |name: &str| -> EclResult<Option<f64>> {
            let item = reference.item(name)?;
            if item.has_value(0) {
                item.get_double(0).map(Some)
            } else {
                Ok(None)
            }
        };
        let table = SimpleTable::from_values(
            "PLYSHLOG",
            &data_values(data)?,
            &[
                ("WaterVelocity", ColumnOrder::StrictlyIncreasing),
                ("ShearMultiplier", ColumnOrder::Random),
            ],
        )?;
        Ok(Self {
            ref_polymer_concentration: reference.item("REF_POLYMER_CONCENTRATION")?.get_double(0)?,
            ref_salinity: optional("REF_SALINITY")?,
            ref_temperature: optional("REF_TEMPERATURE")?,
            table,
        })
    }

    pub fn ref_polymer_concentration(&self) -> f64 {
        self.ref_polymer_concentration
    }

    pub fn ref_salinity(&self) -> Option<f64> {
        self.ref_salinity
    }

    pub fn ref_temperature(&self) -> Option<f64> {
        self.ref_temperature
    }

    pub fn water_velocity(&self) -> &[f64] {
        self.table.column("WaterVelocity").unwrap_or_default()
    }

    pub fn shear_multiplier(&self) -> &[f64] {
        self.table.column("ShearMultiplier").unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableManager {
    rocktab: Vec<RocktabTable>,
    plyshlog: Vec<PlyshlogTable>,
}

impl TableManager {
    pub fn from_deck(
        deck: &Deck,
        config: &ParseConfig,
        messages: &mut MessageContainer,
    ) -> EclResult<Self> {
        let mut tables = Self::default();

        let rocktab: Vec<&DeckKeyword> = deck.keywords_named("ROCKTAB").collect();
        match rocktab.as_slice() {
            [] => {}
            [keyword] => {
                tables.rocktab = read_rocktab(deck, keyword, config, messages)
                    .map_err(|error| error.or_at(keyword.location()))?;
            }
            occurrences => {
                let lines: Vec<String> = occurrences
                    .iter()
                    .map(|keyword| keyword.line().to_string())
                    .collect();
                messages.error(
                    "TABLES.AMBIGUOUS_KEYWORD",
                    format!(
                        "ROCKTAB is given {} times (lines {}), all occurrences are ignored",
                        occurrences.len(),
                        lines.join(", ")
                    ),
                );
            }
        }

        if let Some(keyword) = deck.last_keyword("PLYSHLOG") {
            tables.plyshlog = read_plyshlog(keyword, config, messages)
                .map_err(|error| error.or_at(keyword.location()))?;
        }

        tracing::debug!(
            rocktab = tables.rocktab.len(),
            plyshlog = tables.plyshlog.len(),
            "tables loaded"
        );
        Ok(tables)
    }

    pub fn rocktab_tables(&self) -> &[RocktabTable] {
        &self.rocktab
    }

    pub fn plyshlog_tables(&self) -> &[PlyshlogTable] {
        &self.plyshlog
    }
}

fn read_rocktab(
    deck: &Deck,
    keyword: &DeckKeyword,
    config: &ParseConfig,
    messages: &mut MessageContainer,
) -> EclResult<Vec<RocktabTable>> {
    if deck.has_keyword("RKTRMDIR") {
        config.handle(
            ParseErrorKind::UnsupportedRocktabDirectional,
            "directional ROCKTAB tables (RKTRMDIR) are not supported, ROCKTAB is ignored",
            messages,
        )?;
        return Ok(Vec::new());
    }

    let stress_option = match deck.last_keyword("ROCKOPTS") {
        Some(rockopts) => rockopts.record(0)?.item("METHOD")?.get_string(0)? == "STRESS",
        None => false,
    };
    keyword
        .records()
        .iter()
        .enumerate()
        .map(|(index, record)| {
            RocktabTable::new(record, stress_option)
                .map_err(|error| error.or_at(keyword.location().with_record(index)))
        })
        .collect()
}

fn read_plyshlog(
    keyword: &DeckKeyword,
    config: &ParseConfig,
    messages: &mut MessageContainer,
) -> EclResult<Vec<PlyshlogTable>> {
    match keyword.records() {
        [reference, data] => Ok(vec![PlyshlogTable::new(reference, data)?]),
        records => {
            config.handle(
                ParseErrorKind::UnsupportedPlyshlogSchema,
                format!(
                    "PLYSHLOG with {} records uses the alternating table layout, which is not supported",
                    records.len()
                ),
                messages,
            )?;
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnOrder, SimpleTable};

    const SCHEMA: &[(&str, ColumnOrder)] = &[
        ("P", ColumnOrder::StrictlyDecreasing),
        ("M", ColumnOrder::Random),
    ];

    #[test]
    fn defaulted_values_are_interpolated() {
        let values = [
            Some(300.0),
            Some(1.0),
            Some(200.0),
            None,
            Some(100.0),
            Some(0.8),
            Some(50.0),
            None,
        ];
        let table = SimpleTable::from_values("TEST", &values, SCHEMA).expect("valid table");
        let multiplier = table.column("M").expect("M column");
        assert!((multiplier[1] - 0.9).abs() < 1e-12);
        assert_eq!(multiplier[3], 0.8);
        assert_eq!(table.num_rows(), 4);
    }

    #[test]
    fn argument_order_is_enforced() {
        let values = [Some(100.0), Some(1.0), Some(200.0), Some(1.0)];
        let error = SimpleTable::from_values("TEST", &values, SCHEMA).expect_err("increasing");
        assert_eq!(error.placeholder(), "TABLES.COLUMN_ORDER");
    }

    #[test]
    fn ragged_data_is_rejected() {
        let values = [Some(100.0), Some(1.0), Some(50.0)];
        let error = SimpleTable::from_values("TEST", &values, SCHEMA).expect_err("ragged");
        assert_eq!(error.placeholder(), "TABLES.COLUMN_COUNT");
    }

    #[test]
    fn argument_cannot_be_defaulted() {
        let values = [None, Some(1.0)];
        let error = SimpleTable::from_values("TEST", &values, SCHEMA).expect_err("defaulted");
        assert_eq!(error.placeholder(), "TABLES.DEFAULTED_ARGUMENT");
    }
}
