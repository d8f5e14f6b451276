use std::error::Error;
use std::fmt::{Display, Formatter};

pub type EclResult<T> = Result<T, EclError>;
pub type ParserResult<T> = EclResult<T>;
pub type SummaryResult<T> = EclResult<T>;
pub type ScheduleResult<T> = EclResult<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EclErrorCategory {
    Success,
    StructuralFormatError,
    InvalidInputError,
    UnsupportedFeatureError,
    IoSystemError,
    InternalError,
}

impl EclErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::StructuralFormatError => 2,
            Self::InvalidInputError => 3,
            Self::UnsupportedFeatureError => 4,
            Self::IoSystemError => 5,
            Self::InternalError => 6,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::StructuralFormatError => "StructuralFormatError",
            Self::InvalidInputError => "InvalidInputError",
            Self::UnsupportedFeatureError => "UnsupportedFeatureError",
            Self::IoSystemError => "IoSystemError",
            Self::InternalError => "InternalError",
        }
    }

    pub const fn is_fatal(self) -> bool {
        !matches!(self, Self::Success)
    }
}

/// Position inside a deck or header that an error refers to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorLocation {
    pub keyword: Option<String>,
    pub line: Option<usize>,
    pub record: Option<usize>,
    pub item: Option<String>,
}

impl ErrorLocation {
    pub fn keyword(name: impl Into<String>) -> Self {
        Self {
            keyword: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_record(mut self, record: usize) -> Self {
        self.record = Some(record);
        self
    }

    pub fn with_item(mut self, item: impl Into<String>) -> Self {
        self.item = Some(item.into());
        self
    }
}

impl Display for ErrorLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if let Some(keyword) = &self.keyword {
            parts.push(format!("keyword {keyword}"));
        }
        if let Some(line) = self.line {
            parts.push(format!("line {line}"));
        }
        if let Some(record) = self.record {
            parts.push(format!("record {record}"));
        }
        if let Some(item) = &self.item {
            parts.push(format!("item {item}"));
        }
        f.write_str(&parts.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EclError {
    category: EclErrorCategory,
    placeholder: &'static str,
    message: String,
    location: Option<ErrorLocation>,
}

impl EclError {
    pub fn new(
        category: EclErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
            location: None,
        }
    }

    pub fn structural(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(EclErrorCategory::StructuralFormatError, placeholder, message)
    }

    pub fn invalid_input(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(EclErrorCategory::InvalidInputError, placeholder, message)
    }

    pub fn unsupported(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(
            EclErrorCategory::UnsupportedFeatureError,
            placeholder,
            message,
        )
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(EclErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(EclErrorCategory::InternalError, placeholder, message)
    }

    pub fn at(mut self, location: ErrorLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Attaches a location only when none was recorded closer to the failure.
    /// A recorded location without a keyword (an item lookup) is completed
    /// with the keyword, line and record of `location`.
    pub fn or_at(mut self, location: ErrorLocation) -> Self {
        if let Some(inner) = self.location.as_mut() {
            if inner.keyword.is_none() {
                inner.keyword = location.keyword;
                inner.line = inner.line.or(location.line);
                inner.record = inner.record.or(location.record);
            }
        } else {
            self.location = Some(location);
        }
        self
    }

    pub const fn category(&self) -> EclErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> Option<&ErrorLocation> {
        self.location.as_ref()
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        let severity = if self.category.is_fatal() {
            "ERROR"
        } else {
            "INFO"
        };
        match &self.location {
            Some(location) => format!(
                "{}: [{}] {} ({})",
                severity, self.placeholder, self.message, location
            ),
            None => format!("{}: [{}] {}", severity, self.placeholder, self.message),
        }
    }

    pub fn fatal_exit_line(&self) -> Option<String> {
        self.category
            .is_fatal()
            .then(|| format!("FATAL EXIT CODE: {}", self.exit_code()))
    }
}

impl Display for EclError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.as_str(),
            self.placeholder,
            self.message
        )?;
        if let Some(location) = &self.location {
            write!(f, " at {location}")?;
        }
        Ok(())
    }
}

impl Error for EclError {}

#[cfg(test)]
mod tests {
    use super::{EclError, EclErrorCategory, ErrorLocation};

    #[test]
    fn exit_mapping_is_stable() {
        let cases = [
            (EclErrorCategory::Success, 0, "Success"),
            (
                EclErrorCategory::StructuralFormatError,
                2,
                "StructuralFormatError",
            ),
            (EclErrorCategory::InvalidInputError, 3, "InvalidInputError"),
            (
                EclErrorCategory::UnsupportedFeatureError,
                4,
                "UnsupportedFeatureError",
            ),
            (EclErrorCategory::IoSystemError, 5, "IoSystemError"),
            (EclErrorCategory::InternalError, 6, "InternalError"),
        ];

        for (category, exit_code, name) in cases {
            assert_eq!(category.exit_code(), exit_code);
            assert_eq!(category.as_str(), name);
        }
    }

    #[test]
    fn fatal_error_renders_diagnostic_lines() {
        let error = EclError::invalid_input(
            "SCHEDULE.INVALID_CONTROL_MODE",
            "Tried to set invalid control: THP for well: OP1",
        );

        assert_eq!(error.exit_code(), 3);
        assert_eq!(
            error.diagnostic_line(),
            "ERROR: [SCHEDULE.INVALID_CONTROL_MODE] Tried to set invalid control: THP for well: OP1"
        );
        assert_eq!(
            error.fatal_exit_line().as_deref(),
            Some("FATAL EXIT CODE: 3")
        );
    }

    #[test]
    fn location_is_kept_from_the_innermost_site() {
        let error = EclError::structural("DECK.BAD_ITEM", "cannot convert 'x' to INT")
            .at(ErrorLocation::keyword("COMPDAT").with_item("I"))
            .or_at(ErrorLocation::keyword("SCHEDULE").with_line(12));

        let location = error.location().expect("location should be recorded");
        assert_eq!(location.keyword.as_deref(), Some("COMPDAT"));
        assert_eq!(location.item.as_deref(), Some("I"));
        assert!(error.diagnostic_line().contains("keyword COMPDAT, item I"));
    }

    #[test]
    fn item_location_is_completed_by_the_keyword() {
        let error = EclError::invalid_input("DECK.MISSING_VALUE", "item K1 has no value")
            .at(ErrorLocation::default().with_item("K1"))
            .or_at(ErrorLocation::keyword("COMPDAT").with_line(40).with_record(2));

        let location = error.location().expect("location should be recorded");
        assert_eq!(location.to_string(), "keyword COMPDAT, line 40, record 2, item K1");
    }
}
