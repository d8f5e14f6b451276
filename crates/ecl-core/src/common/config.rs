//! Parse-time policy for recoverable input problems.
//!
//! Each problem class maps to an [`ErrorAction`]. The defaults warn and carry
//! on; [`ParseConfig::strict`] turns every class into a hard error.

use super::messages::MessageContainer;
use crate::domain::{EclError, EclResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorAction {
    Throw,
    #[default]
    Warn,
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    UnknownKeyword,
    KeywordWrongSection,
    UnsupportedGeoModifier,
    UnsupportedCompordType,
    UnsupportedRocktabDirectional,
    UnsupportedPlyshlogSchema,
}

impl ParseErrorKind {
    pub const fn placeholder(self) -> &'static str {
        match self {
            Self::UnknownKeyword => "DECK.UNKNOWN_KEYWORD",
            Self::KeywordWrongSection => "DECK.KEYWORD_WRONG_SECTION",
            Self::UnsupportedGeoModifier => "SCHEDULE.UNSUPPORTED_GEO_MODIFIER",
            Self::UnsupportedCompordType => "SCHEDULE.UNSUPPORTED_COMPORD_TYPE",
            Self::UnsupportedRocktabDirectional => "TABLES.UNSUPPORTED_ROCKTAB_DIRECTIONAL",
            Self::UnsupportedPlyshlogSchema => "TABLES.UNSUPPORTED_PLYSHLOG_SCHEMA",
        }
    }

    fn is_structural(self) -> bool {
        matches!(self, Self::UnknownKeyword | Self::KeywordWrongSection)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    pub unknown_keyword: ErrorAction,
    pub keyword_wrong_section: ErrorAction,
    pub unsupported_geo_modifier: ErrorAction,
    pub unsupported_compord_type: ErrorAction,
    pub unsupported_rocktab_directional: ErrorAction,
    pub unsupported_plyshlog_schema: ErrorAction,
}

impl ParseConfig {
    pub fn strict() -> Self {
        Self {
            unknown_keyword: ErrorAction::Throw,
            keyword_wrong_section: ErrorAction::Throw,
            unsupported_geo_modifier: ErrorAction::Throw,
            unsupported_compord_type: ErrorAction::Throw,
            unsupported_rocktab_directional: ErrorAction::Throw,
            unsupported_plyshlog_schema: ErrorAction::Throw,
        }
    }

    pub fn from_json_str(source: &str) -> EclResult<Self> {
        serde_json::from_str(source).map_err(|error| {
            EclError::invalid_input(
                "CONFIG.PARSE",
                format!("invalid parse configuration: {error}"),
            )
        })
    }

    pub fn load(path: &Path) -> EclResult<Self> {
        let source = fs::read_to_string(path).map_err(|error| {
            EclError::io_system(
                "IO.CONFIG_READ",
                format!("failed to read '{}': {}", path.display(), error),
            )
        })?;
        Self::from_json_str(&source)
    }

    pub fn action(&self, kind: ParseErrorKind) -> ErrorAction {
        match kind {
            ParseErrorKind::UnknownKeyword => self.unknown_keyword,
            ParseErrorKind::KeywordWrongSection => self.keyword_wrong_section,
            ParseErrorKind::UnsupportedGeoModifier => self.unsupported_geo_modifier,
            ParseErrorKind::UnsupportedCompordType => self.unsupported_compord_type,
            ParseErrorKind::UnsupportedRocktabDirectional => self.unsupported_rocktab_directional,
            ParseErrorKind::UnsupportedPlyshlogSchema => self.unsupported_plyshlog_schema,
        }
    }

    /// Applies the configured action: error out, record a warning, or drop.
    pub fn handle(
        &self,
        kind: ParseErrorKind,
        message: impl Into<String>,
        messages: &mut MessageContainer,
    ) -> EclResult<()> {
        let message = message.into();
        match self.action(kind) {
            ErrorAction::Throw if kind.is_structural() => {
                Err(EclError::structural(kind.placeholder(), message))
            }
            ErrorAction::Throw => Err(EclError::unsupported(kind.placeholder(), message)),
            ErrorAction::Warn => {
                messages.warning(kind.placeholder(), message);
                Ok(())
            }
            ErrorAction::Ignore => {
                tracing::debug!(placeholder = kind.placeholder(), "{message}");
                Ok(())
            }
        }
    }
}
