use std::error::Error;
use std::fmt::{Display, Formatter};

pub type GrainResult<T> = Result<T, GrainError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrainErrorCategory {
    InputValidationError,
    IoSystemError,
    ShapeMismatch,
    DegenerateTrace,
    EmptyInput,
    InternalError,
}

impl GrainErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InputValidationError => 2,
            Self::IoSystemError => 3,
            Self::ShapeMismatch | Self::DegenerateTrace => 4,
            Self::EmptyInput => 5,
            Self::InternalError => 6,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputValidationError => "InputValidationError",
            Self::IoSystemError => "IoSystemError",
            Self::ShapeMismatch => "ShapeMismatchError",
            Self::DegenerateTrace => "DegenerateTraceError",
            Self::EmptyInput => "EmptyInputError",
            Self::InternalError => "InternalError",
        }
    }
}

impl Display for GrainErrorCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrainError {
    category: GrainErrorCategory,
    code: &'static str,
    message: String,
}

impl GrainError {
    pub fn new(category: GrainErrorCategory, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            category,
            code,
            message: message.into(),
        }
    }

    pub fn input_validation(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(GrainErrorCategory::InputValidationError, code, message)
    }

    pub fn io_system(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(GrainErrorCategory::IoSystemError, code, message)
    }

    pub fn shape_mismatch(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(GrainErrorCategory::ShapeMismatch, code, message)
    }

    pub fn degenerate_trace(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(GrainErrorCategory::DegenerateTrace, code, message)
    }

    pub fn empty_input(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(GrainErrorCategory::EmptyInput, code, message)
    }

    pub fn internal(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(GrainErrorCategory::InternalError, code, message)
    }

    pub const fn category(&self) -> GrainErrorCategory {
        self.category
    }

    pub const fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.code, self.message)
    }
}

impl Display for GrainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}] {}", self.category, self.code, self.message)
    }
}

impl Error for GrainError {}
