use std::error::Error;
use std::fmt::{Display, Formatter};

pub type NnpResult<T> = Result<T, NnpError>;
pub type FormatResult<T> = Result<T, FormatError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NnpErrorCategory {
    InputValidationError,
    IoSystemError,
    ComputationError,
    InternalError,
}

impl NnpErrorCategory {
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
pub struct NnpError {
    category: NnpErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl NnpError {
    pub fn new(
        category: NnpErrorCategory,
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
        Self::new(NnpErrorCategory::InputValidationError, placeholder, message)
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(NnpErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn computation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(NnpErrorCategory::ComputationError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(NnpErrorCategory::InternalError, placeholder, message)
    }

    pub const fn category(&self) -> NnpErrorCategory {
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
}

impl Display for NnpError {
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

impl Error for NnpError {}

/// Failures raised while decoding one of the trainer's flat-file formats.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormatError {
    #[error("{file}: line {line}: expected {expected} columns, found {found}")]
    ColumnCount {
        file: &'static str,
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("{file}: line {line}: token '{token}' is not a valid {kind}")]
    InvalidToken {
        file: &'static str,
        line: usize,
        token: String,
        kind: &'static str,
    },
    #[error("{file}: missing required entry '{key}'")]
    MissingKey { file: &'static str, key: String },
    #[error("{file}: {message}")]
    Inconsistent { file: &'static str, message: String },
}

impl From<FormatError> for NnpError {
    fn from(error: FormatError) -> Self {
        NnpError::input_validation("INPUT.FORMAT", error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{FormatError, NnpError, NnpErrorCategory};

    #[test]
    fn exit_mapping_is_stable() {
        let cases = [
            (NnpErrorCategory::InputValidationError, 2),
            (NnpErrorCategory::IoSystemError, 3),
            (NnpErrorCategory::ComputationError, 4),
            (NnpErrorCategory::InternalError, 5),
        ];

        for (category, exit_code) in cases {
            assert_eq!(category.exit_code(), exit_code);
        }
    }

    #[test]
    fn diagnostic_line_carries_placeholder() {
        let error = NnpError::computation("RUN.NNP_TRAIN", "nnp-train exited with return code 1");

        assert_eq!(error.exit_code(), 4);
        assert_eq!(
            error.diagnostic_line(),
            "ERROR: [RUN.NNP_TRAIN] nnp-train exited with return code 1"
        );
        assert_eq!(
            error.to_string(),
            "ComputationError [RUN.NNP_TRAIN] nnp-train exited with return code 1"
        );
    }

    #[test]
    fn format_errors_become_input_validation_errors() {
        let error: NnpError = FormatError::ColumnCount {
            file: "scaling.data",
            line: 4,
            expected: 6,
            found: 5,
        }
        .into();

        assert_eq!(error.category(), NnpErrorCategory::InputValidationError);
        assert_eq!(error.placeholder(), "INPUT.FORMAT");
        assert_eq!(
            error.message(),
            "scaling.data: line 4: expected 6 columns, found 5"
        );
    }
}
