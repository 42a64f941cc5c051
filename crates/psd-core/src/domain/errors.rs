use super::{ChannelKey, ResponseKind};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type PsdResult<T> = Result<T, PsdError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PsdErrorCategory {
    InputValidationError,
    IoSystemError,
    ComputationError,
    InternalError,
}

impl PsdErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InputValidationError => 2,
            Self::IoSystemError => 3,
            Self::ComputationError => 4,
            Self::InternalError => 5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputValidationError => "InputValidationError",
            Self::IoSystemError => "IoSystemError",
            Self::ComputationError => "ComputationError",
            Self::InternalError => "InternalError",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsdError {
    category: PsdErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl PsdError {
    pub fn new(
        category: PsdErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn input_validation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(PsdErrorCategory::InputValidationError, placeholder, message)
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(PsdErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn computation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(PsdErrorCategory::ComputationError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(PsdErrorCategory::InternalError, placeholder, message)
    }

    /// Raised when a whole input yields no channels or no frequencies.
    pub fn empty_input(message: impl Into<String>) -> Self {
        Self::input_validation("INPUT.EMPTY_INPUT", message)
    }

    pub const fn category(&self) -> PsdErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> String {
        format!("FATAL EXIT CODE: {}", self.exit_code())
    }
}

impl Display for PsdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.as_str(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for PsdError {}

/// Conditions that degrade output but never abort a run.
#[derive(Debug, Clone, PartialEq)]
pub enum PsdWarning {
    /// A channel header did not carry a usable node id / DOF code.
    MalformedHeader { line: usize, text: String },
    /// A schema-required channel is absent; the missing-data policy filled it.
    MissingChannel { key: ChannelKey },
    /// A header was seen but no data row was accepted for it.
    EmptyChannel { key: ChannelKey },
    /// The channel does not cover the shared frequency axis exactly.
    AxisMismatch {
        key: ChannelKey,
        samples: usize,
        axis_len: usize,
    },
    /// Two tables being diffed disagree on their measurement rows.
    SchemaMismatch {
        kind: Option<ResponseKind>,
        current_rows: usize,
        baseline_rows: usize,
        shared_rows: usize,
    },
    /// A current column has no baseline counterpart; its values pass through.
    MissingBaselineColumn { column: String },
    /// A stiffness card could not be decoded.
    MalformedCard { line: usize, reason: String },
}

impl PsdWarning {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MalformedHeader { .. } => "WARN.MALFORMED_HEADER",
            Self::MissingChannel { .. } => "WARN.MISSING_CHANNEL",
            Self::EmptyChannel { .. } => "WARN.EMPTY_CHANNEL",
            Self::AxisMismatch { .. } => "WARN.AXIS_MISMATCH",
            Self::SchemaMismatch { .. } => "WARN.SCHEMA_MISMATCH",
            Self::MissingBaselineColumn { .. } => "WARN.MISSING_BASELINE_COLUMN",
            Self::MalformedCard { .. } => "WARN.MALFORMED_CARD",
        }
    }

    pub fn diagnostic_line(&self) -> String {
        format!("WARNING: [{}] {}", self.code(), self)
    }
}

impl Display for PsdWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedHeader { line, text } => {
                write!(f, "ignoring malformed channel header at line {line}: '{text}'")
            }
            Self::MissingChannel { key } => write!(f, "no data for channel {key}"),
            Self::EmptyChannel { key } => write!(f, "channel {key} has a header but no data rows"),
            Self::AxisMismatch {
                key,
                samples,
                axis_len,
            } => write!(
                f,
                "channel {key} reports {samples} samples that do not cover the {axis_len}-point frequency axis"
            ),
            Self::SchemaMismatch {
                kind,
                current_rows,
                baseline_rows,
                shared_rows,
            } => {
                if let Some(kind) = kind {
                    write!(f, "{} ", kind.label())?;
                }
                write!(
                    f,
                    "measurement rows differ (current={current_rows}, baseline={baseline_rows}); using {shared_rows} shared rows"
                )
            }
            Self::MissingBaselineColumn { column } => write!(
                f,
                "column {column} not found in baseline; current values kept"
            ),
            Self::MalformedCard { line, reason } => {
                write!(f, "skipping stiffness card at line {line}: {reason}")
            }
        }
    }
}
