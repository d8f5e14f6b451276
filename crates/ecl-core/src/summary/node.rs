use super::var_type::{VarType, classify};
use serde::Serialize;

/// Well name written for columns that carry no well or group.
pub const DUMMY_WELL: &str = ":+:+:+:+";
pub const PARAMS_GLOBAL_DEFAULT: f32 = -99.0;

const TOTAL_SUFFIXES: &[&str] = &[
    "OPT", "GPT", "WPT", "GIT", "WIT", "OPTF", "OPTS", "OIT", "OVPT", "OVIT", "MWT", "WVPT", "WVIT",
    "GMT", "GPTF", "SGT", "GST", "FGT", "GCT", "GIMT", "WGPT", "WGIT", "EGT", "EXGT", "GVPT", "GVIT",
    "LPT", "VPT", "VIT", "NPT", "NIT", "CPT", "CIT",
];
const SEGMENT_TOTAL_SUFFIXES: &[&str] = &["OFT", "GFT", "WFT"];
const RATE_SUFFIXES: &[&str] = &[
    "OPR", "GPR", "WPR", "LPR", "OIR", "GIR", "WIR", "LIR", "GOR", "WCT", "OFR", "GFR", "WFR",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridDims {
    pub nx: i32,
    pub ny: i32,
    pub nz: i32,
}

impl GridDims {
    pub const fn new(nx: i32, ny: i32, nz: i32) -> Self {
        Self { nx, ny, nz }
    }

    /// 1-based (i, j, k) to the 1-based flattened cell number, `None` when a
    /// coordinate falls outside the grid.
    pub fn cell_number(self, i: i32, j: i32, k: i32) -> Option<i32> {
        if !(1..=self.nx).contains(&i) || !(1..=self.ny).contains(&j) || !(1..=self.nz).contains(&k)
        {
            return None;
        }
        let layer = self.nx.checked_mul(self.ny)?;
        (k - 1)
            .checked_mul(layer)?
            .checked_add((j - 1).checked_mul(self.nx)?)?
            .checked_add(i)
    }

    pub fn cell_ijk(self, num: i32) -> [i32; 3] {
        let layer = match self.nx.checked_mul(self.ny) {
            Some(layer) if self.nx > 0 && layer > 0 => layer,
            _ => return [num, 1, 1],
        };
        let global = num - 1;
        let k = global / layer;
        let j = (global - k * layer) / self.nx;
        let i = global - k * layer - j * self.nx;
        [i + 1, j + 1, k + 1]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LgrLocation {
    pub name: String,
    pub i: i32,
    pub j: i32,
    pub k: i32,
}

/// One column of the per-timestep parameter vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryNode {
    var_type: VarType,
    keyword: String,
    wgname: Option<String>,
    num: Option<i32>,
    unit: String,
    params_index: Option<usize>,
    ijk: Option<[i32; 3]>,
    lgr: Option<LgrLocation>,
    is_total: bool,
    is_rate: bool,
    is_historical: bool,
    default_value: f32,
    gen_key1: String,
    gen_key2: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryNodeBuilder {
    keyword: String,
    unit: String,
    wgname: Option<String>,
    num: Option<i32>,
    lgr: Option<LgrLocation>,
    params_index: Option<usize>,
    default_value: f32,
}

impl SummaryNodeBuilder {
    pub fn new(keyword: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into().trim().to_string(),
            unit: unit.into().trim().to_string(),
            wgname: None,
            num: None,
            lgr: None,
            params_index: None,
            default_value: PARAMS_GLOBAL_DEFAULT,
        }
    }

    pub fn wgname(mut self, wgname: impl Into<String>) -> Self {
        let wgname = wgname.into().trim().to_string();
        self.wgname = (!wgname.is_empty()).then_some(wgname);
        self
    }

    pub fn num(mut self, num: i32) -> Self {
        self.num = Some(num);
        self
    }

    pub fn lgr(mut self, lgr: LgrLocation) -> Self {
        self.lgr = Some(lgr);
        self
    }

    /// Presets the column; otherwise the index assigns the next free one.
    pub fn params_index(mut self, index: usize) -> Self {
        self.params_index = Some(index);
        self
    }

    pub fn default_value(mut self, value: f32) -> Self {
        self.default_value = value;
        self
    }

    /// `None` when the column cannot be addressed, e.g. a well vector with the
    /// dummy well name or a region vector with a negative number.
    pub fn build(self, grid: GridDims, key_join: &str) -> Option<SummaryNode> {
        let var_type = classify(&self.keyword);
        if !is_valid(var_type, self.wgname.as_deref(), self.num, self.lgr.as_ref()) {
            return None;
        }

        let wgname = if var_type.needs_wgname()
            || matches!(var_type, VarType::LocalWell | VarType::LocalCompletion)
        {
            self.wgname
        } else {
            None
        };
        let num = if var_type.needs_num() { self.num } else { None };
        let ijk = match (var_type, num) {
            (VarType::Block | VarType::Completion, Some(num)) => Some(grid.cell_ijk(num)),
            _ => None,
        };
        let lgr = if var_type.is_local() { self.lgr } else { None };

        let mut node = SummaryNode {
            var_type,
            is_total: identify_total(&self.keyword, var_type),
            is_rate: identify_rate(&self.keyword),
            is_historical: var_type != VarType::Misc && self.keyword.ends_with('H'),
            keyword: self.keyword,
            wgname,
            num,
            unit: self.unit,
            params_index: self.params_index,
            ijk,
            lgr,
            default_value: self.default_value,
            gen_key1: String::new(),
            gen_key2: None,
        };
        node.set_gen_keys(key_join);
        Some(node)
    }
}

fn is_dummy(wgname: Option<&str>) -> bool {
    wgname.is_none_or(|name| name.is_empty() || name == DUMMY_WELL)
}

fn is_valid(
    var_type: VarType,
    wgname: Option<&str>,
    num: Option<i32>,
    lgr: Option<&LgrLocation>,
) -> bool {
    let negative_num = num.is_none_or(|num| num < 0);
    match var_type {
        VarType::Invalid => false,
        VarType::Well | VarType::Group => !is_dummy(wgname),
        VarType::Completion | VarType::Segment => !is_dummy(wgname) && !negative_num,
        VarType::Region | VarType::RegionToRegion | VarType::Block | VarType::Aquifer => {
            !negative_num
        }
        VarType::LocalWell | VarType::LocalCompletion => lgr.is_some() && !is_dummy(wgname),
        VarType::LocalBlock => lgr.is_some(),
        VarType::Field | VarType::Misc | VarType::Network => true,
    }
}

fn suffix(keyword: &str) -> &str {
    keyword.get(1..).unwrap_or("")
}

fn identify_total(keyword: &str, var_type: VarType) -> bool {
    let suffix = suffix(keyword);
    match var_type {
        VarType::Well
        | VarType::Group
        | VarType::Field
        | VarType::Region
        | VarType::Completion => TOTAL_SUFFIXES.iter().any(|total| suffix.starts_with(total)),
        VarType::Segment => SEGMENT_TOTAL_SUFFIXES
            .iter()
            .any(|total| suffix.starts_with(total)),
        _ => false,
    }
}

fn identify_rate(keyword: &str) -> bool {
    let suffix = suffix(keyword);
    RATE_SUFFIXES.iter().any(|rate| suffix.starts_with(rate))
}

impl SummaryNode {
    fn set_gen_keys(&mut self, join: &str) {
        let keyword = &self.keyword;
        let wgname = self.wgname.as_deref().unwrap_or("");
        let num = self.num.unwrap_or(0);
        let (key1, key2) = match self.var_type {
            VarType::Field | VarType::Misc | VarType::Network | VarType::Invalid => {
                (keyword.clone(), None)
            }
            VarType::Well | VarType::Group => (format!("{keyword}{join}{wgname}"), None),
            VarType::Region | VarType::Aquifer => (format!("{keyword}{join}{num}"), None),
            VarType::Segment => (format!("{keyword}{join}{wgname}{join}{num}"), None),
            VarType::Block => {
                let [i, j, k] = self.ijk.unwrap_or([0, 0, 0]);
                (
                    format!("{keyword}{join}{i},{j},{k}"),
                    Some(format!("{keyword}{join}{num}")),
                )
            }
            VarType::Completion => {
                let [i, j, k] = self.ijk.unwrap_or([0, 0, 0]);
                (
                    format!("{keyword}{join}{wgname}{join}{i},{j},{k}"),
                    Some(format!("{keyword}{join}{wgname}{join}{num}")),
                )
            }
            VarType::RegionToRegion => {
                let (r1, r2) = decode_r1r2(num);
                (
                    format!("{keyword}{join}{r1}-{r2}"),
                    Some(format!("{keyword}{join}{num}")),
                )
            }
            VarType::LocalWell => {
                let lgr = self.lgr.as_ref().map_or("", |lgr| lgr.name.as_str());
                (format!("{keyword}{join}{lgr}{join}{wgname}"), None)
            }
            VarType::LocalBlock => match &self.lgr {
                Some(lgr) => (
                    format!("{keyword}{join}{}{join}{},{},{}", lgr.name, lgr.i, lgr.j, lgr.k),
                    None,
                ),
                None => (keyword.clone(), None),
            },
            VarType::LocalCompletion => match &self.lgr {
                Some(lgr) => (
                    format!(
                        "{keyword}{join}{}{join}{wgname}{join}{},{},{}",
                        lgr.name, lgr.i, lgr.j, lgr.k
                    ),
                    None,
                ),
                None => (keyword.clone(), None),
            },
        };
        self.gen_key1 = key1;
        self.gen_key2 = key2;
    }

    pub fn var_type(&self) -> VarType {
        self.var_type
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn wgname(&self) -> Option<&str> {
        self.wgname.as_deref()
    }

    pub fn num(&self) -> Option<i32> {
        self.num
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// `None` only before the node has been inserted into an index.
    pub fn params_index(&self) -> Option<usize> {
        self.params_index
    }

    pub(crate) fn assign_params_index(&mut self, index: usize) {
        self.params_index = Some(index);
    }

    pub fn ijk(&self) -> Option<[i32; 3]> {
        self.ijk
    }

    pub fn lgr(&self) -> Option<&LgrLocation> {
        self.lgr.as_ref()
    }

    pub fn is_total(&self) -> bool {
        self.is_total
    }

    pub fn is_rate(&self) -> bool {
        self.is_rate
    }

    pub fn is_historical(&self) -> bool {
        self.is_historical
    }

    pub fn default_value(&self) -> f32 {
        self.default_value
    }

    pub fn gen_key1(&self) -> &str {
        &self.gen_key1
    }

    pub fn gen_key2(&self) -> Option<&str> {
        self.gen_key2.as_deref()
    }

    /// Source and target region of a region-to-region vector.
    pub fn region_pair(&self) -> Option<(i32, i32)> {
        match (self.var_type, self.num) {
            (VarType::RegionToRegion, Some(num)) => Some(decode_r1r2(num)),
            _ => None,
        }
    }
}

fn decode_r1r2(num: i32) -> (i32, i32) {
    let r1 = num % 32768;
    let r2 = (num - r1) / 32768 - 10;
    (r1, r2)
}
