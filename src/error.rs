use std::fmt;

impl std::error::Error for StrumError {}

#[derive(Debug, Clone, PartialEq)]
pub enum StrumError {
    ParseError(String),
    FileError(String),
    AudioError(String),
    InvalidInstrument(String),
    UnknownKey(String),
}

impl StrumError {
    /// Prefixes a parse error with the line it came from. Other errors pass through unchanged.
    pub fn at_line(self, line: usize) -> Self {
        match self {
            StrumError::ParseError(msg) => StrumError::ParseError(format!("line {}: {}", line, msg)),
            StrumError::UnknownKey(code) => StrumError::UnknownKey(format!("{} (line {})", code, line)),
            other => other,
        }
    }
}

impl fmt::Display for StrumError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StrumError::ParseError(msg) => write!(f, "Parsing Error: {}", msg),
            StrumError::FileError(msg) => write!(f, "File Error: {}", msg),
            StrumError::AudioError(msg) => write!(f, "Audio Error: {}", msg),
            StrumError::InvalidInstrument(msg) => write!(f, "Invalid Instrument Error: {}", msg),
            StrumError::UnknownKey(code) => write!(f, "Unknown Key: {}", code),
        }
    }
}

impl From<std::io::Error> for StrumError {
    fn from(e: std::io::Error) -> Self {
        StrumError::FileError(e.to_string())
    }
}

impl From<hound::Error> for StrumError {
    fn from(e: hound::Error) -> Self {
        match e {
            hound::Error::IoError(io) => StrumError::FileError(io.to_string()),
            other => StrumError::AudioError(other.to_string()),
        }
    }
}

impl From<cpal::BuildStreamError> for StrumError {
    fn from(e: cpal::BuildStreamError) -> Self {
        StrumError::AudioError(format!("Failed to build stream: {}", e))
    }
}

impl From<cpal::PlayStreamError> for StrumError {
    fn from(e: cpal::PlayStreamError) -> Self {
        StrumError::AudioError(format!("Failed to play stream: {}", e))
    }
}
