use thiserror::Error;

/// Failure to turn payload text into single-byte characters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("invalid input: character {ch:?} at position {position} is not 7-bit ASCII")]
    NonAscii { ch: char, position: usize },
}

pub type Result<T> = std::result::Result<T, EncodingError>;
