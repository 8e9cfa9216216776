use super::constants::ENCODING_VERSION;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobEncodeError {
    DataTooLarge { len: usize },
    Overflow { remaining: usize },
}

impl std::fmt::Display for BlobEncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DataTooLarge { len } => write!(f, "data is too large for blob. len={len}"),
            Self::Overflow { remaining } => {
                write!(f, "failed to fit all data into blob. bytes remaining: {remaining}")
            }
        }
    }
}

impl std::error::Error for BlobEncodeError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobDecodeError {
    BadVersion { got: u8 },
    LengthPrefixOutOfRange { len: usize },
    FieldElementHighBit { element_index: usize },
}

impl std::fmt::Display for BlobDecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadVersion { got } => {
                write!(f, "invalid blob, expected version {ENCODING_VERSION}, got {got}")
            }
            Self::LengthPrefixOutOfRange { len } => {
                write!(f, "invalid blob, length prefix out of range: {len}")
            }
            Self::FieldElementHighBit { element_index } => {
                write!(
                    f,
                    "invalid blob, field element {element_index} has highest order bit set"
                )
            }
        }
    }
}

impl std::error::Error for BlobDecodeError {}
