use alloy::primitives::Bytes;

use super::{
    Blob, Data,
    constants::{BLOB_SIZE, ENCODING_VERSION, MAX_BLOB_DATA_SIZE, ROUNDS, VERSION_OFFSET},
    error::BlobDecodeError,
};

pub struct BlobDecoder {
    read_offset: usize,
    write_offset: usize,
    data: Vec<u8>,
}

impl BlobDecoder {
    /// Decodes the blob back into the raw payload it was encoded from.
    /// See [`super::BlobCoder::encode`] for the encoding scheme.
    ///
    /// Every field element of the blob is validated, whether or not it
    /// carries payload, so a hostile blob never decodes partially.
    pub fn decode(blob: &Blob) -> Result<Data, BlobDecodeError> {
        BlobDecoder::new().decode_blob(blob)
    }

    fn new() -> Self {
        Self {
            read_offset: 0,
            write_offset: 0,
            data: vec![0u8; BLOB_SIZE],
        }
    }

    fn decode_blob(mut self, blob: &Blob) -> Result<Data, BlobDecodeError> {
        let b = blob.as_slice();

        if b[VERSION_OFFSET] != ENCODING_VERSION {
            return Err(BlobDecodeError::BadVersion {
                got: b[VERSION_OFFSET],
            });
        }

        // 24-bit big-endian payload length from bytes [2..5]
        let data_len = u32::from_be_bytes([0, b[2], b[3], b[4]]) as usize;
        if data_len > MAX_BLOB_DATA_SIZE {
            return Err(BlobDecodeError::LengthPrefixOutOfRange { len: data_len });
        }

        // first round: the header element carries only 27 payload bytes
        if b[0] & 0b1000_0000 != 0 {
            return Err(BlobDecodeError::FieldElementHighBit { element_index: 0 });
        }
        let mut leading = [0u8; 4];
        leading[0] = b[0];
        self.data[..27].copy_from_slice(&b[5..32]);
        self.read_offset = 32;
        self.write_offset = 27;
        for byte in leading.iter_mut().skip(1) {
            *byte = self.decode_fe(b)?;
        }
        self.restore_spill_bytes(leading);

        for _ in 1..ROUNDS {
            for byte in &mut leading {
                *byte = self.decode_fe(b)?;
            }
            self.restore_spill_bytes(leading);
        }

        self.data.truncate(data_len);
        Ok(Bytes::from(self.data))
    }

    /// Copies the 31-byte tail of the field element at `read_offset` into the
    /// output and returns its leading byte.
    fn decode_fe(&mut self, b: &[u8]) -> Result<u8, BlobDecodeError> {
        let leading = b[self.read_offset];
        if leading & 0b1000_0000 != 0 {
            return Err(BlobDecodeError::FieldElementHighBit {
                element_index: self.read_offset / 32,
            });
        }
        self.data[self.write_offset..self.write_offset + 31]
            .copy_from_slice(&b[self.read_offset + 1..self.read_offset + 32]);
        self.read_offset += 32;
        self.write_offset += 31;
        Ok(leading)
    }

    /// Reassembles the three payload bytes whose bits were spilled across the
    /// four leading bytes of a round's field elements.
    fn restore_spill_bytes(&mut self, leading: [u8; 4]) {
        let s0 = (leading[0] & 0b0011_1111) | ((leading[3] & 0b0011_0000) << 2);
        let s1 = (leading[1] & 0b0011_1111) | ((leading[3] & 0b0000_1100) << 4);
        let s2 = (leading[2] & 0b0011_1111) | ((leading[3] & 0b0000_0011) << 6);
        self.data[self.write_offset] = s0;
        self.data[self.write_offset + 1] = s1;
        self.data[self.write_offset + 2] = s2;
        self.write_offset += 3;
    }
}
