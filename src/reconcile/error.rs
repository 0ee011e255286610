#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImportError {
    #[error("unsupported file type: {path} (expected a .csv file)")]
    InvalidFileType { path: String },
    #[error("could not parse CSV: {0}")]
    Parse(String),
    #[error("line {line}: {reasons}")]
    Validation { line: usize, reasons: String },
    #[error("line {line}: {reason}")]
    DuplicateSkip { line: usize, reason: String },
    #[error("line {line}: write failed: {reason}")]
    WriteFailure { line: usize, reason: String },
}

impl ImportError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFileType { .. } => "invalid_file_type",
            Self::Parse(_) => "parse_failed",
            Self::Validation { .. } => "validation_failed",
            Self::DuplicateSkip { .. } => "duplicate_skip",
            Self::WriteFailure { .. } => "write_failed",
        }
    }
}

impl From<csv::Error> for ImportError {
    fn from(e: csv::Error) -> Self {
        Self::Parse(e.to_string())
    }
}
