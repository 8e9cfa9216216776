use super::{
    Blob,
    constants::{BLOB_SIZE, ENCODING_VERSION, MAX_BLOB_DATA_SIZE, ROUNDS},
    error::BlobEncodeError,
};

pub struct BlobCoder {
    read_offset: usize,
    blob_offset: usize,
    blob: [u8; BLOB_SIZE],
}

impl BlobCoder {
    /// Encodes the given payload into a fresh blob.
    ///
    /// In each round, 4x31 payload bytes are placed into bytes [1..32] of the
    /// next four field elements, and 3 more payload bytes are split across the
    /// leading bytes of those elements: the low six bits of each go into the
    /// leading bytes of the first three elements, the high two bits of all
    /// three are packed into the leading byte of the fourth. Every leading
    /// byte therefore keeps its top two bits clear, which keeps each field
    /// element below the BLS modulus. Up to 1024 rounds are run until the
    /// payload is exhausted.
    ///
    /// The first field element of the first round reserves bytes [1..5] for
    /// the encoding version and the big-endian 24-bit payload length, so it
    /// carries only 27 payload bytes.
    pub fn encode(data: &[u8]) -> Result<Blob, BlobEncodeError> {
        BlobCoder::new().encode_data(data)
    }

    fn new() -> Self {
        Self {
            read_offset: 0,
            blob_offset: 0,
            blob: [0u8; BLOB_SIZE],
        }
    }

    fn read1(&mut self, data: &[u8]) -> u8 {
        if self.read_offset >= data.len() {
            return 0;
        }
        let r = data[self.read_offset];
        self.read_offset += 1;
        r
    }

    fn read31(&mut self, data: &[u8]) -> [u8; 31] {
        let mut result = [0u8; 31];
        let available_bytes = (data.len() - self.read_offset).min(31);
        result[..available_bytes]
            .copy_from_slice(&data[self.read_offset..self.read_offset + available_bytes]);
        self.read_offset += available_bytes;
        result
    }

    fn write_fe(&mut self, leading_byte: u8, tail31: &[u8; 31]) {
        self.blob[self.blob_offset] = leading_byte;
        self.blob[self.blob_offset + 1..self.blob_offset + 32].copy_from_slice(tail31);
        self.blob_offset += 32;
    }

    fn encode_data(mut self, data: &[u8]) -> Result<Blob, BlobEncodeError> {
        if data.len() > MAX_BLOB_DATA_SIZE {
            return Err(BlobEncodeError::DataTooLarge { len: data.len() });
        }

        for round in 0..ROUNDS {
            if round > 0 && self.read_offset >= data.len() {
                break;
            }

            let tail0 = if round == 0 {
                // the header round always runs, even for an empty payload
                let mut buf31 = [0u8; 31];
                buf31[0] = ENCODING_VERSION;
                let ilen = data.len() as u32;
                buf31[1..4].copy_from_slice(&ilen.to_be_bytes()[1..]);
                let to_read = data.len().min(27); // 27 = 31 - 4
                buf31[4..4 + to_read].copy_from_slice(&data[..to_read]);
                self.read_offset += to_read;
                buf31
            } else {
                self.read31(data)
            };
            let tail1 = self.read31(data);
            let tail2 = self.read31(data);
            let tail3 = self.read31(data);

            let s0 = self.read1(data);
            let s1 = self.read1(data);
            let s2 = self.read1(data);

            self.write_fe(s0 & 0b0011_1111, &tail0);
            self.write_fe(s1 & 0b0011_1111, &tail1);
            self.write_fe(s2 & 0b0011_1111, &tail2);
            self.write_fe(
                ((s0 & 0b1100_0000) >> 2) | ((s1 & 0b1100_0000) >> 4) | ((s2 & 0b1100_0000) >> 6),
                &tail3,
            );
        }

        if self.read_offset < data.len() {
            return Err(BlobEncodeError::Overflow {
                remaining: data.len() - self.read_offset,
            });
        }

        Ok(Blob::from(self.blob))
    }
}
