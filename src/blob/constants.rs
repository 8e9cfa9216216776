pub const BLOB_SIZE: usize = 4096 * 32; // byte size of a blob. 4096 field elements * 32 bytes
pub const FIELD_SIZE: usize = 4 * 32; // byte size of a field group composed of 4 field elements
pub const FIELD_CAPACITY: usize = 4 * 31 + 3; // number of payload bytes written per encode/decode round
pub const DATA_LENGTH_SIZE: usize = 4; // number of header bytes holding the version and data length
pub const ROUNDS: usize = 1024; // number of encode/decode rounds (field groups per blob)
pub const MAX_BLOB_DATA_SIZE: usize = FIELD_CAPACITY * ROUNDS - DATA_LENGTH_SIZE; // maximum number of bytes that can be encoded in the blob
pub const ENCODING_VERSION: u8 = 0;
pub const VERSION_OFFSET: usize = 1; // offset of the version byte in the blob encoding
