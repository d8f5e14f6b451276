//! Reader and writer for ECL keyword files (SMSPEC and friends).
//!
//! A file is a flat sequence of keywords, each a fixed-width name, an item
//! count, a four-character type tag and the data. The unformatted form is
//! big-endian Fortran sequential records; the formatted form is ASCII.

mod formatted;
mod unformatted;

use crate::domain::EclError;
use std::fs;
use std::path::{Path, PathBuf};

pub type EclFileResult<T> = Result<T, EclFileError>;

#[derive(Debug, thiserror::Error)]
pub enum EclFileError {
    #[error("failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("record marker mismatch: head {head}, tail {tail}")]
    RecordMarker { head: i32, tail: i32 },
    #[error("unexpected end of data while reading {context}")]
    Truncated { context: String },
    #[error("unknown data type '{0}'")]
    UnknownType(String),
    #[error("invalid value '{value}' in keyword {keyword}")]
    InvalidValue { keyword: String, value: String },
    #[error("keyword {keyword} declares {declared} items but holds {found}")]
    CountMismatch {
        keyword: String,
        declared: usize,
        found: usize,
    },
    #[error("keyword name '{0}' does not fit in 8 characters")]
    NameTooLong(String),
}

impl From<EclFileError> for EclError {
    fn from(error: EclFileError) -> Self {
        match error {
            EclFileError::Io { .. } => EclError::io_system("IO.ECL_FILE", error.to_string()),
            other => EclError::structural("ECL_FILE.FORMAT", other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EclType {
    Inte,
    Real,
    Doub,
    Char,
    Logi,
    Mess,
}

impl EclType {
    pub fn from_tag(tag: &str) -> EclFileResult<Self> {
        match tag.trim() {
            "INTE" => Ok(Self::Inte),
            "REAL" => Ok(Self::Real),
            "DOUB" => Ok(Self::Doub),
            "CHAR" => Ok(Self::Char),
            "LOGI" => Ok(Self::Logi),
            "MESS" => Ok(Self::Mess),
            other => Err(EclFileError::UnknownType(other.to_string())),
        }
    }

    pub const fn tag(self) -> &'static str {
        match self {
            Self::Inte => "INTE",
            Self::Real => "REAL",
            Self::Doub => "DOUB",
            Self::Char => "CHAR",
            Self::Logi => "LOGI",
            Self::Mess => "MESS",
        }
    }

    const fn element_size(self) -> usize {
        match self {
            Self::Inte | Self::Real | Self::Logi => 4,
            Self::Doub | Self::Char => 8,
            Self::Mess => 0,
        }
    }

    const fn block_size(self) -> usize {
        match self {
            Self::Char => 105,
            _ => 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EclData {
    Int(Vec<i32>),
    Real(Vec<f32>),
    Double(Vec<f64>),
    Char(Vec<String>),
    Logical(Vec<bool>),
    Message,
}

impl EclData {
    pub fn ecl_type(&self) -> EclType {
        match self {
            Self::Int(_) => EclType::Inte,
            Self::Real(_) => EclType::Real,
            Self::Double(_) => EclType::Doub,
            Self::Char(_) => EclType::Char,
            Self::Logical(_) => EclType::Logi,
            Self::Message => EclType::Mess,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Int(values) => values.len(),
            Self::Real(values) => values.len(),
            Self::Double(values) => values.len(),
            Self::Char(values) => values.len(),
            Self::Logical(values) => values.len(),
            Self::Message => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EclKeyword {
    pub name: String,
    pub data: EclData,
}

impl EclKeyword {
    pub fn new(name: impl Into<String>, data: EclData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn ints(&self) -> Option<&[i32]> {
        match &self.data {
            EclData::Int(values) => Some(values),
            _ => None,
        }
    }

    pub fn reals(&self) -> Option<&[f32]> {
        match &self.data {
            EclData::Real(values) => Some(values),
            _ => None,
        }
    }

    pub fn doubles(&self) -> Option<&[f64]> {
        match &self.data {
            EclData::Double(values) => Some(values),
            _ => None,
        }
    }

    pub fn strings(&self) -> Option<&[String]> {
        match &self.data {
            EclData::Char(values) => Some(values),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EclFile {
    keywords: Vec<EclKeyword>,
}

impl EclFile {
    pub fn new(keywords: Vec<EclKeyword>) -> Self {
        Self { keywords }
    }

    pub fn push(&mut self, keyword: EclKeyword) {
        self.keywords.push(keyword);
    }

    pub fn keywords(&self) -> &[EclKeyword] {
        &self.keywords
    }

    pub fn find(&self, name: &str) -> Option<&EclKeyword> {
        self.keywords.iter().find(|keyword| keyword.name == name)
    }

    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a EclKeyword> {
        self.keywords.iter().filter(move |keyword| keyword.name == name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn from_unformatted_bytes(bytes: &[u8]) -> EclFileResult<Self> {
        unformatted::read_keywords(bytes).map(Self::new)
    }

    pub fn to_unformatted_bytes(&self) -> EclFileResult<Vec<u8>> {
        unformatted::write_keywords(&self.keywords)
    }

    pub fn from_formatted_str(source: &str) -> EclFileResult<Self> {
        formatted::read_keywords(source).map(Self::new)
    }

    pub fn to_formatted_string(&self) -> EclFileResult<String> {
        formatted::write_keywords(&self.keywords)
    }

    /// Reads a file, choosing the formatted reader for `F`-prefixed extensions.
    pub fn open(path: &Path) -> EclFileResult<Self> {
        let io_error = |source| EclFileError::Io {
            path: path.to_path_buf(),
            source,
        };
        if is_formatted_path(path) {
            let source = fs::read_to_string(path).map_err(io_error)?;
            Self::from_formatted_str(&source)
        } else {
            let bytes = fs::read(path).map_err(io_error)?;
            Self::from_unformatted_bytes(&bytes)
        }
    }

    pub fn write(&self, path: &Path, formatted: bool) -> EclFileResult<()> {
        let bytes = if formatted {
            self.to_formatted_string()?.into_bytes()
        } else {
            self.to_unformatted_bytes()?
        };
        fs::write(path, bytes).map_err(|source| EclFileError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

pub fn is_formatted_path(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.starts_with(['F', 'f']))
}
