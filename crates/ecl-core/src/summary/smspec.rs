use super::natural_cmp::natural_cmp;
use super::node::{
    DUMMY_WELL, GridDims, LgrLocation, PARAMS_GLOBAL_DEFAULT, SummaryNode, SummaryNodeBuilder,
};
use super::var_type::{VarType, classify};
use crate::domain::{EclError, SummaryResult};
use crate::ecl_file::{EclData, EclFile, EclKeyword, is_formatted_path};
use crate::units::UnitSystem;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use globset::{Glob, GlobMatcher};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

const RESTART_CHUNKS: usize = 9;
const CHUNK_WIDTH: usize = 8;
const DEFAULT_SIMULATOR_ID: i32 = 100;
const INVALID_COLUMN_KEYWORD: &str = "WWCT";
const INVALID_COLUMN_UNIT: &str = "????????";

/// Key of the flat completion index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompletionKey {
    pub well: String,
    pub cell: i32,
    pub keyword: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateIndices {
    pub day: usize,
    pub month: usize,
    pub year: usize,
}

/// The in-memory form of an SMSPEC header.
///
/// Nodes live in one arena; every index stores handles into it. A header read
/// from disk is immutable in practice, while a writer accepts [`insert`]
/// until [`lock`] is called, which happens implicitly once the first data row
/// is appended.
///
/// [`insert`]: SummarySpec::insert
/// [`lock`]: SummarySpec::lock
#[derive(Debug, Clone)]
pub struct SummarySpec {
    nodes: Vec<SummaryNode>,
    general: HashMap<String, usize>,
    well: HashMap<String, HashMap<String, usize>>,
    group: HashMap<String, HashMap<String, usize>>,
    field: HashMap<String, usize>,
    misc: HashMap<String, usize>,
    region: HashMap<String, HashMap<i32, usize>>,
    block: HashMap<String, HashMap<i32, usize>>,
    completion: HashMap<CompletionKey, usize>,

    grid: GridDims,
    start_time: NaiveDateTime,
    time_seconds: Option<f64>,
    time_index: Option<usize>,
    date_indices: Option<DateIndices>,
    formatted: bool,
    params_size: usize,
    params_default: Vec<f32>,
    unit_system: UnitSystem,
    simulator_id: i32,
    restart_case: Option<String>,
    restart_step: i32,
    header_file: Option<PathBuf>,
    key_join: String,
    locked: bool,
}

fn missing(keyword: &str) -> EclError {
    EclError::structural(
        "SMSPEC.MISSING_KEYWORD",
        format!("summary header is missing required keyword {keyword}"),
    )
}

fn require_ints<'a>(file: &'a EclFile, keyword: &str) -> SummaryResult<&'a [i32]> {
    let found = file.find(keyword).ok_or_else(|| missing(keyword))?;
    found.ints().ok_or_else(|| {
        EclError::structural("SMSPEC.KEYWORD_TYPE", format!("{keyword} must be INTE data"))
    })
}

fn require_strings<'a>(file: &'a EclFile, keyword: &str) -> SummaryResult<&'a [String]> {
    let found = file.find(keyword).ok_or_else(|| missing(keyword))?;
    found.strings().ok_or_else(|| {
        EclError::structural("SMSPEC.KEYWORD_TYPE", format!("{keyword} must be CHAR data"))
    })
}

fn optional_ints<'a>(file: &'a EclFile, keyword: &str) -> SummaryResult<Option<&'a [i32]>> {
    match file.find(keyword) {
        Some(_) => require_ints(file, keyword).map(Some),
        None => Ok(None),
    }
}

fn check_width(keyword: &str, found: usize, expected: usize) -> SummaryResult<()> {
    if found < expected {
        return Err(EclError::structural(
            "SMSPEC.ARRAY_LENGTH",
            format!("{keyword} holds {found} entries, KEYWORDS declares {expected}"),
        ));
    }
    Ok(())
}

fn start_from_startdat(values: &[i32]) -> SummaryResult<NaiveDateTime> {
    let invalid = || {
        EclError::structural(
            "SMSPEC.STARTDAT",
            format!("STARTDAT {values:?} is not a valid date"),
        )
    };
    let [day, month, year] = match values.get(0..3) {
        Some(&[day, month, year]) => [day, month, year],
        _ => return Err(invalid()),
    };
    let hour = values.get(3).copied().unwrap_or(0);
    let minute = values.get(4).copied().unwrap_or(0);
    let micros = values.get(5).copied().unwrap_or(0);

    let to_u32 = |value: i32| u32::try_from(value).map_err(|_| invalid());
    NaiveDate::from_ymd_opt(year, to_u32(month)?, to_u32(day)?)
        .and_then(|date| {
            date.and_hms_micro_opt(
                to_u32(hour).ok()?,
                to_u32(minute).ok()?,
                to_u32(micros / 1_000_000).ok()?,
                to_u32(micros % 1_000_000).ok()?,
            )
        })
        .ok_or_else(invalid)
}

fn compile_glob(pattern: &str) -> SummaryResult<GlobMatcher> {
    Glob::new(pattern)
        .map(|glob| glob.compile_matcher())
        .map_err(|error| {
            EclError::invalid_input(
                "SMSPEC.INVALID_PATTERN",
                format!("invalid pattern '{pattern}': {error}"),
            )
        })
}

fn sorted_names<'a>(
    names: impl Iterator<Item = &'a String>,
    pattern: Option<&str>,
) -> SummaryResult<Vec<String>> {
    let matcher = pattern.map(compile_glob).transpose()?;
    let mut selected: Vec<String> = names
        .filter(|name| matcher.as_ref().is_none_or(|matcher| matcher.is_match(name.as_str())))
        .cloned()
        .collect();
    selected.sort_by(|left, right| natural_cmp(left, right));
    Ok(selected)
}

impl SummarySpec {
    fn empty(grid: GridDims, start_time: NaiveDateTime) -> Self {
        Self {
            nodes: Vec::new(),
            general: HashMap::new(),
            well: HashMap::new(),
            group: HashMap::new(),
            field: HashMap::new(),
            misc: HashMap::new(),
            region: HashMap::new(),
            block: HashMap::new(),
            completion: HashMap::new(),
            grid,
            start_time,
            time_seconds: None,
            time_index: None,
            date_indices: None,
            formatted: false,
            params_size: 0,
            params_default: Vec::new(),
            unit_system: UnitSystem::default(),
            simulator_id: DEFAULT_SIMULATOR_ID,
            restart_case: None,
            restart_step: 0,
            header_file: None,
            key_join: ":".to_string(),
            locked: false,
        }
    }

    /// Loads an SMSPEC header, formatted or unformatted by file extension.
    pub fn open(path: &Path) -> SummaryResult<Self> {
        let file = EclFile::open(path)?;
        Self::from_ecl_file(&file, Some(path))
    }

    pub fn from_ecl_file(file: &EclFile, header_file: Option<&Path>) -> SummaryResult<Self> {
        let keywords = require_strings(file, "KEYWORDS")?;
        let wgnames = if file.has("WGNAMES") {
            require_strings(file, "WGNAMES")?
        } else {
            require_strings(file, "NAMES")?
        };
        let units = require_strings(file, "UNITS")?;
        let startdat = require_ints(file, "STARTDAT")?;
        let dimens = require_ints(file, "DIMENS")?;
        let nums = optional_ints(file, "NUMS")?;

        let width = keywords.len();
        check_width("WGNAMES", wgnames.len(), width)?;
        check_width("UNITS", units.len(), width)?;
        if let Some(nums) = nums {
            check_width("NUMS", nums.len(), width)?;
        }
        let [nx, ny, nz] = match dimens.get(1..4) {
            Some(&[nx, ny, nz]) => [nx, ny, nz],
            _ => {
                return Err(EclError::structural(
                    "SMSPEC.DIMENS",
                    format!("DIMENS needs at least 4 entries, found {}", dimens.len()),
                ));
            }
        };

        let mut spec = Self::empty(GridDims::new(nx, ny, nz), start_from_startdat(startdat)?);
        spec.restart_step = dimens.get(5).copied().unwrap_or(0);
        spec.header_file = header_file.map(Path::to_path_buf);
        spec.formatted = header_file.is_some_and(is_formatted_path);

        if let Some(intehead) = optional_ints(file, "INTEHEAD")? {
            if let Some(unit_system) = intehead.first().copied().and_then(UnitSystem::from_intehead) {
                spec.unit_system = unit_system;
            }
            if let Some(simulator_id) = intehead.get(1) {
                spec.simulator_id = *simulator_id;
            }
        }
        if let Some(restart) = file.find("RESTART").and_then(EclKeyword::strings) {
            let case: String = restart.iter().take(RESTART_CHUNKS).map(String::as_str).collect();
            let case = case.trim();
            spec.restart_case = (!case.is_empty()).then(|| case.to_string());
        }

        let lgrs = file.find("LGRS").and_then(EclKeyword::strings);
        let numlx = optional_ints(file, "NUMLX")?;
        let numly = optional_ints(file, "NUMLY")?;
        let numlz = optional_ints(file, "NUMLZ")?;

        spec.params_size = width;
        spec.params_default = vec![PARAMS_GLOBAL_DEFAULT; width];
        for (index, keyword) in keywords.iter().enumerate() {
            let mut builder = SummaryNodeBuilder::new(keyword.as_str(), units[index].as_str())
                .wgname(wgnames[index].as_str())
                .params_index(index);
            if let Some(nums) = nums {
                builder = builder.num(nums[index]);
            }
            if classify(keyword.trim()).is_local() {
                let lgr = lgrs.and_then(|lgrs| lgrs.get(index)).map(|name| LgrLocation {
                    name: name.trim().to_string(),
                    i: numlx.and_then(|values| values.get(index)).copied().unwrap_or(0),
                    j: numly.and_then(|values| values.get(index)).copied().unwrap_or(0),
                    k: numlz.and_then(|values| values.get(index)).copied().unwrap_or(0),
                });
                if let Some(lgr) = lgr {
                    builder = builder.lgr(lgr);
                }
            }

            match builder.build(spec.grid, &spec.key_join) {
                Some(node) => {
                    spec.params_default[index] = node.default_value();
                    spec.push_node(node);
                }
                None => tracing::trace!(column = index, keyword = %keyword, "skipping invalid summary column"),
            }
        }

        spec.resolve_time()?;
        tracing::debug!(
            columns = width,
            nodes = spec.nodes.len(),
            "loaded summary header"
        );
        Ok(spec)
    }

    fn resolve_time(&mut self) -> SummaryResult<()> {
        if let Some(&handle) = self.misc.get("TIME") {
            let node = &self.nodes[handle];
            self.time_seconds = Some(match node.unit() {
                "DAYS" => 86_400.0,
                "HOURS" => 3_600.0,
                other => {
                    return Err(EclError::structural(
                        "SMSPEC.TIME_UNIT",
                        format!("TIME unit '{other}' is neither DAYS nor HOURS"),
                    ));
                }
            });
            self.time_index = node.params_index();
            return Ok(());
        }

        let column = |keyword: &str| {
            self.misc
                .get(keyword)
                .and_then(|handle| self.nodes[*handle].params_index())
        };
        match (column("DAY"), column("MONTH"), column("YEAR")) {
            (Some(day), Some(month), Some(year)) => {
                self.date_indices = Some(DateIndices { day, month, year });
                Ok(())
            }
            _ => Err(EclError::structural(
                "SMSPEC.NO_TIME",
                "summary header has neither TIME nor DAY/MONTH/YEAR vectors",
            )),
        }
    }

    /// A write-mode header holding only the TIME vector at column 0.
    pub fn writer(start: NaiveDateTime, time_in_days: bool, grid: GridDims) -> Self {
        let mut spec = Self::empty(grid, start);
        let (unit, seconds) = if time_in_days {
            ("DAYS", 86_400.0)
        } else {
            ("HOURS", 3_600.0)
        };
        let time = SummaryNodeBuilder::new("TIME", unit)
            .params_index(0)
            .build(grid, ":");
        if let Some(time) = time {
            spec.params_size = 1;
            spec.params_default = vec![time.default_value()];
            spec.push_node(time);
        }
        spec.time_seconds = Some(seconds);
        spec.time_index = Some(0);
        spec
    }

    /// Like [`SummarySpec::writer`] for a run restarted from `restart_case`.
    ///
    /// A case name too long for the RESTART keyword is dropped with a warning.
    pub fn restart_writer(
        restart_case: &str,
        restart_step: i32,
        start: NaiveDateTime,
        time_in_days: bool,
        grid: GridDims,
    ) -> Self {
        let mut spec = Self::writer(start, time_in_days, grid);
        if restart_case.len() <= RESTART_CHUNKS * CHUNK_WIDTH {
            spec.restart_case = Some(restart_case.to_string());
            spec.restart_step = restart_step;
        } else {
            tracing::warn!(restart_case, "restart case name too long, ignored");
        }
        spec
    }

    fn push_node(&mut self, node: SummaryNode) {
        let handle = self.nodes.len();
        self.general.insert(node.gen_key1().to_string(), handle);
        if let Some(key2) = node.gen_key2() {
            self.general.insert(key2.to_string(), handle);
        }

        let keyword = node.keyword().to_string();
        let wgname = node.wgname().unwrap_or_default().to_string();
        match (node.var_type(), node.num()) {
            (VarType::Well, _) => {
                self.well.entry(wgname).or_default().insert(keyword, handle);
            }
            (VarType::Group, _) => {
                self.group.entry(wgname).or_default().insert(keyword, handle);
            }
            (VarType::Field, _) => {
                self.field.insert(keyword, handle);
            }
            (VarType::Misc, _) => {
                self.misc.insert(keyword, handle);
            }
            (VarType::Region, Some(num)) => {
                self.region.entry(keyword).or_default().insert(num, handle);
            }
            (VarType::Block, Some(num)) => {
                self.block.entry(keyword).or_default().insert(num, handle);
            }
            (VarType::Completion, Some(cell)) => {
                self.completion.insert(
                    CompletionKey {
                        well: wgname,
                        cell,
                        keyword,
                    },
                    handle,
                );
            }
            _ => {}
        }
        self.nodes.push(node);
    }

    /// Appends `node`, assigning the next free column when it has none.
    pub fn insert(&mut self, mut node: SummaryNode) -> SummaryResult<usize> {
        if self.locked {
            return Err(EclError::invalid_input(
                "SMSPEC.LOCKED",
                format!(
                    "cannot add {} after data has been written",
                    node.gen_key1()
                ),
            ));
        }
        let index = match node.params_index() {
            Some(index) => {
                if let Some(owner) = self.column_owner(index) {
                    return Err(EclError::structural(
                        "SMSPEC.DUPLICATE_COLUMN",
                        format!(
                            "column {index} already holds {}, cannot add {}",
                            owner.gen_key1(),
                            node.gen_key1()
                        ),
                    ));
                }
                index
            }
            None => {
                node.assign_params_index(self.params_size);
                self.params_size
            }
        };
        self.params_size = self.params_size.max(index + 1);
        self.params_default
            .resize(self.params_size, PARAMS_GLOBAL_DEFAULT);
        self.params_default[index] = node.default_value();
        self.push_node(node);
        Ok(index)
    }

    fn column_owner(&self, index: usize) -> Option<&SummaryNode> {
        self.nodes
            .iter()
            .find(|node| node.params_index() == Some(index))
    }

    pub fn add_node(
        &mut self,
        keyword: &str,
        wgname: Option<&str>,
        num: Option<i32>,
        unit: &str,
        default_value: f32,
    ) -> SummaryResult<usize> {
        let mut builder = SummaryNodeBuilder::new(keyword, unit).default_value(default_value);
        if let Some(wgname) = wgname {
            builder = builder.wgname(wgname);
        }
        if let Some(num) = num {
            builder = builder.num(num);
        }
        let node = builder.build(self.grid, &self.key_join).ok_or_else(|| {
            EclError::invalid_input(
                "SMSPEC.INVALID_NODE",
                format!(
                    "{keyword} with well/group {wgname:?} and num {num:?} is not a valid summary vector"
                ),
            )
        })?;
        self.insert(node)
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    fn resolve(&self, handle: Option<&usize>) -> Option<&SummaryNode> {
        handle.and_then(|handle| self.nodes.get(*handle))
    }

    pub fn lookup_general(&self, key: &str) -> Option<&SummaryNode> {
        self.resolve(self.general.get(key))
    }

    pub fn lookup_well(&self, well: &str, keyword: &str) -> Option<&SummaryNode> {
        self.resolve(self.well.get(well).and_then(|by_keyword| by_keyword.get(keyword)))
    }

    pub fn lookup_group(&self, group: &str, keyword: &str) -> Option<&SummaryNode> {
        self.resolve(self.group.get(group).and_then(|by_keyword| by_keyword.get(keyword)))
    }

    pub fn lookup_field(&self, keyword: &str) -> Option<&SummaryNode> {
        self.resolve(self.field.get(keyword))
    }

    pub fn lookup_misc(&self, keyword: &str) -> Option<&SummaryNode> {
        self.resolve(self.misc.get(keyword))
    }

    /// `region` is 1-based.
    pub fn lookup_region(&self, keyword: &str, region: i32) -> Option<&SummaryNode> {
        self.resolve(self.region.get(keyword).and_then(|by_num| by_num.get(&region)))
    }

    /// `i`, `j` and `k` are 1-based.
    pub fn lookup_block(&self, keyword: &str, i: i32, j: i32, k: i32) -> Option<&SummaryNode> {
        let cell = self.grid.cell_number(i, j, k)?;
        self.resolve(self.block.get(keyword).and_then(|by_num| by_num.get(&cell)))
    }

    pub fn lookup_completion(&self, well: &str, keyword: &str, cell: i32) -> Option<&SummaryNode> {
        let key = CompletionKey {
            well: well.to_string(),
            cell,
            keyword: keyword.to_string(),
        };
        self.resolve(self.completion.get(&key))
    }

    pub fn has_general(&self, key: &str) -> bool {
        self.general.contains_key(key)
    }

    pub fn has_well(&self, well: &str, keyword: &str) -> bool {
        self.lookup_well(well, keyword).is_some()
    }

    pub fn has_group(&self, group: &str, keyword: &str) -> bool {
        self.lookup_group(group, keyword).is_some()
    }

    pub fn has_field(&self, keyword: &str) -> bool {
        self.field.contains_key(keyword)
    }

    pub fn has_misc(&self, keyword: &str) -> bool {
        self.misc.contains_key(keyword)
    }

    pub fn has_region(&self, keyword: &str, region: i32) -> bool {
        self.lookup_region(keyword, region).is_some()
    }

    pub fn has_block(&self, keyword: &str, i: i32, j: i32, k: i32) -> bool {
        self.lookup_block(keyword, i, j, k).is_some()
    }

    pub fn has_completion(&self, well: &str, keyword: &str, cell: i32) -> bool {
        self.lookup_completion(well, keyword, cell).is_some()
    }

    /// General keys matching the shell glob `pattern` that are not already in
    /// `exclude`, in natural order.
    ///
    /// TIME is left out when the pattern is absent or `*`; a narrower pattern
    /// that names it explicitly still selects it.
    pub fn select_matching(
        &self,
        pattern: Option<&str>,
        exclude: &HashSet<String>,
    ) -> SummaryResult<Vec<String>> {
        let skip_time = matches!(pattern, None | Some("*"));
        let matcher = pattern.map(compile_glob).transpose()?;

        let mut keys: Vec<String> = self
            .general
            .keys()
            .filter(|key| !(skip_time && key.as_str() == "TIME"))
            .filter(|key| !exclude.contains(key.as_str()))
            .filter(|key| matcher.as_ref().is_none_or(|matcher| matcher.is_match(key.as_str())))
            .cloned()
            .collect();
        keys.sort_by(|left, right| natural_cmp(left, right));
        Ok(keys)
    }

    /// For every column of `self`, the column in `other` holding the same
    /// vector, or -1.
    pub fn compute_mapping(&self, other: &SummarySpec) -> Vec<i64> {
        let mut mapping = vec![-1_i64; self.params_size];
        for node in &self.nodes {
            let Some(index) = node.params_index() else {
                continue;
            };
            if let Some(target) = other
                .lookup_general(node.gen_key1())
                .and_then(SummaryNode::params_index)
            {
                mapping[index] = target as i64;
            }
        }
        mapping
    }

    /// Fails when `key` is unknown; callers check `has_general` first.
    pub fn is_accumulated_total(&self, key: &str) -> SummaryResult<bool> {
        self.lookup_general(key)
            .map(SummaryNode::is_total)
            .ok_or_else(|| {
                EclError::invalid_input(
                    "SMSPEC.UNKNOWN_KEY",
                    format!("summary key '{key}' does not exist"),
                )
            })
    }

    pub fn well_list(&self, pattern: Option<&str>) -> SummaryResult<Vec<String>> {
        sorted_names(self.well.keys(), pattern)
    }

    pub fn group_list(&self, pattern: Option<&str>) -> SummaryResult<Vec<String>> {
        sorted_names(self.group.keys(), pattern)
    }

    pub fn num_regions(&self) -> i32 {
        self.region
            .values()
            .flat_map(|by_num| by_num.keys().copied())
            .max()
            .unwrap_or(0)
    }

    pub fn nodes(&self) -> &[SummaryNode] {
        &self.nodes
    }

    pub fn node(&self, handle: usize) -> Option<&SummaryNode> {
        self.nodes.get(handle)
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn params_size(&self) -> usize {
        self.params_size
    }

    pub fn params_default(&self) -> &[f32] {
        &self.params_default
    }

    pub fn start_time(&self) -> NaiveDateTime {
        self.start_time
    }

    pub fn grid_dims(&self) -> GridDims {
        self.grid
    }

    pub fn time_seconds(&self) -> Option<f64> {
        self.time_seconds
    }

    pub fn time_index(&self) -> Option<usize> {
        self.time_index
    }

    pub fn date_indices(&self) -> Option<DateIndices> {
        self.date_indices
    }

    pub fn unit_system(&self) -> UnitSystem {
        self.unit_system
    }

    pub fn set_unit_system(&mut self, unit_system: UnitSystem) {
        self.unit_system = unit_system;
    }

    pub fn simulator_id(&self) -> i32 {
        self.simulator_id
    }

    pub fn restart_case(&self) -> Option<&str> {
        self.restart_case.as_deref()
    }

    pub fn restart_step(&self) -> i32 {
        self.restart_step
    }

    pub fn first_step(&self) -> i32 {
        if self.restart_step > 0 {
            self.restart_step + 1
        } else {
            1
        }
    }

    pub fn header_file(&self) -> Option<&Path> {
        self.header_file.as_deref()
    }

    pub fn is_formatted(&self) -> bool {
        self.formatted
    }

    pub fn key_join(&self) -> &str {
        &self.key_join
    }

    /// Column-ordered view; `None` marks columns that hold no valid vector.
    fn columns(&self) -> Vec<Option<&SummaryNode>> {
        let mut columns = vec![None; self.params_size];
        for node in &self.nodes {
            if let Some(slot) = node.params_index().and_then(|index| columns.get_mut(index)) {
                *slot = Some(node);
            }
        }
        columns
    }

    pub fn to_ecl_file(&self) -> EclFile {
        let columns = self.columns();
        let mut file = EclFile::default();

        file.push(EclKeyword::new(
            "INTEHEAD",
            EclData::Int(vec![self.unit_system.intehead_code(), self.simulator_id]),
        ));

        let case = self.restart_case.as_deref().unwrap_or("");
        let restart: Vec<String> = (0..RESTART_CHUNKS)
            .map(|chunk| {
                case.chars()
                    .skip(chunk * CHUNK_WIDTH)
                    .take(CHUNK_WIDTH)
                    .collect()
            })
            .collect();
        file.push(EclKeyword::new("RESTART", EclData::Char(restart)));

        let width = i32::try_from(self.params_size).unwrap_or(i32::MAX);
        file.push(EclKeyword::new(
            "DIMENS",
            EclData::Int(vec![
                width,
                self.grid.nx,
                self.grid.ny,
                self.grid.nz,
                0,
                self.restart_step,
            ]),
        ));

        let column_strings = |value: fn(&SummaryNode) -> String, missing: &str| -> Vec<String> {
            columns
                .iter()
                .map(|node| node.map_or_else(|| missing.to_string(), value))
                .collect()
        };
        file.push(EclKeyword::new(
            "KEYWORDS",
            EclData::Char(column_strings(
                |node| node.keyword().to_string(),
                INVALID_COLUMN_KEYWORD,
            )),
        ));
        file.push(EclKeyword::new(
            "WGNAMES",
            EclData::Char(column_strings(
                |node| node.wgname().unwrap_or(DUMMY_WELL).to_string(),
                DUMMY_WELL,
            )),
        ));

        if self.nodes.iter().any(|node| node.var_type().needs_num()) {
            let nums = columns
                .iter()
                .map(|node| node.and_then(SummaryNode::num).unwrap_or(0))
                .collect();
            file.push(EclKeyword::new("NUMS", EclData::Int(nums)));
        }

        if self.nodes.iter().any(|node| node.lgr().is_some()) {
            let lgr_field = |value: fn(&LgrLocation) -> i32| -> Vec<i32> {
                columns
                    .iter()
                    .map(|node| node.and_then(SummaryNode::lgr).map_or(0, value))
                    .collect()
            };
            file.push(EclKeyword::new(
                "LGRS",
                EclData::Char(
                    columns
                        .iter()
                        .map(|node| {
                            node.and_then(SummaryNode::lgr)
                                .map(|lgr| lgr.name.clone())
                                .unwrap_or_default()
                        })
                        .collect(),
                ),
            ));
            file.push(EclKeyword::new("NUMLX", EclData::Int(lgr_field(|lgr| lgr.i))));
            file.push(EclKeyword::new("NUMLY", EclData::Int(lgr_field(|lgr| lgr.j))));
            file.push(EclKeyword::new("NUMLZ", EclData::Int(lgr_field(|lgr| lgr.k))));
        }

        file.push(EclKeyword::new(
            "UNITS",
            EclData::Char(column_strings(
                |node| node.unit().to_string(),
                INVALID_COLUMN_UNIT,
            )),
        ));

        let start = self.start_time;
        let micros = start.second() * 1_000_000 + start.nanosecond() / 1_000;
        file.push(EclKeyword::new(
            "STARTDAT",
            EclData::Int(vec![
                start.day() as i32,
                start.month() as i32,
                start.year(),
                start.hour() as i32,
                start.minute() as i32,
                i32::try_from(micros).unwrap_or(0),
            ]),
        ));
        file
    }

    pub fn write(&self, path: &Path, formatted: bool) -> SummaryResult<()> {
        self.to_ecl_file().write(path, formatted)?;
        tracing::debug!(path = %path.display(), columns = self.params_size, "wrote summary header");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SummarySpec;
    use crate::domain::EclErrorCategory;
    use crate::summary::{GridDims, PARAMS_GLOBAL_DEFAULT};
    use chrono::NaiveDate;
    use std::collections::HashSet;

    fn writer() -> SummarySpec {
        let start = NaiveDate::from_ymd_opt(2000, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .expect("valid date");
        SummarySpec::writer(start, true, GridDims::new(10, 10, 5))
    }

    #[test]
    fn writer_starts_with_time_column() {
        let spec = writer();
        assert_eq!(spec.params_size(), 1);
        assert_eq!(spec.time_index(), Some(0));
        assert_eq!(spec.time_seconds(), Some(86_400.0));
        assert!(spec.has_misc("TIME"));
    }

    #[test]
    fn add_node_grows_defaults_and_indices() {
        let mut spec = writer();
        let index = spec
            .add_node("WOPR", Some("OP1"), None, "SM3/DAY", 1.5)
            .expect("insert should succeed");
        assert_eq!(index, 1);
        assert_eq!(spec.params_default(), &[0.0, 1.5]);
        assert!(spec.has_well("OP1", "WOPR"));
        assert_eq!(spec.well_list(None).expect("list"), vec!["OP1".to_string()]);
    }

    #[test]
    fn preset_params_index_pads_defaults() {
        let mut spec = writer();
        let node = crate::summary::SummaryNodeBuilder::new("FOPT", "SM3")
            .params_index(3)
            .build(spec.grid_dims(), ":")
            .expect("field node");
        spec.insert(node).expect("insert");
        assert_eq!(spec.params_size(), 4);
        assert_eq!(spec.params_default()[1], PARAMS_GLOBAL_DEFAULT);
        assert_eq!(spec.params_default()[2], PARAMS_GLOBAL_DEFAULT);
    }

    #[test]
    fn invalid_node_is_rejected_by_add_node() {
        let mut spec = writer();
        let error = spec
            .add_node("WOPR", None, None, "SM3/DAY", 0.0)
            .expect_err("well vector without well must fail");
        assert_eq!(error.placeholder(), "SMSPEC.INVALID_NODE");
        assert_eq!(error.category(), EclErrorCategory::InvalidInputError);
    }

    #[test]
    fn region_and_completion_lookups() {
        let mut spec = writer();
        spec.add_node("RPR", None, Some(2), "BARSA", 0.0).expect("region");
        spec.add_node("COPR", Some("OP1"), Some(15), "SM3/DAY", 0.0)
            .expect("completion");

        assert!(spec.has_region("RPR", 2));
        assert!(!spec.has_region("RPR", 1));
        assert!(spec.has_completion("OP1", "COPR", 15));
        assert!(spec.has_general("COPR:OP1:5,2,1"));
        assert_eq!(spec.num_regions(), 2);
    }

    #[test]
    fn invalid_glob_is_reported() {
        let spec = writer();
        let error = spec
            .select_matching(Some("W[OPR"), &HashSet::new())
            .expect_err("broken glob should fail");
        assert_eq!(error.placeholder(), "SMSPEC.INVALID_PATTERN");
    }

    #[test]
    fn explicit_pattern_can_select_time() {
        let spec = writer();
        let keys = spec
            .select_matching(Some("TI*"), &HashSet::new())
            .expect("valid glob");
        assert_eq!(keys, vec!["TIME".to_string()]);
    }

    #[test]
    fn first_step_follows_restart() {
        let start = writer().start_time();
        let spec = SummarySpec::restart_writer("BASE", 12, start, true, GridDims::new(1, 1, 1));
        assert_eq!(spec.restart_case(), Some("BASE"));
        assert_eq!(spec.first_step(), 13);
        assert_eq!(writer().first_step(), 1);

        let long_case = "X".repeat(80);
        let spec = SummarySpec::restart_writer(&long_case, 3, start, true, GridDims::new(1, 1, 1));
        assert_eq!(spec.restart_case(), None);
        assert_eq!(spec.first_step(), 1);
    }
}
