use crate::codec::{Decoder, Encoder};
use pvfs_types::PvfsError;

/// Currently exactly one encoding is defined (§6): little-endian bytefield.
pub const ENCODING_LE_BYTEFIELD: u32 = 0;

/// Fixed 8-byte preamble on every wire message: LE protocol release, LE encoding tag
/// (§4.1, §6).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct GenericHeader {
    pub release: u32,
    pub encoding: u32,
}

impl GenericHeader {
    pub const SIZE: usize = 8;

    #[inline]
    pub fn new(release: u32) -> GenericHeader {
        GenericHeader {
            release,
            encoding: ENCODING_LE_BYTEFIELD,
        }
    }

    pub fn encode(&self, enc: &mut Encoder) {
        enc.write_u32(self.release);
        enc.write_u32(self.encoding);
    }

    pub fn decode(dec: &mut Decoder) -> Result<GenericHeader, PvfsError> {
        let release = dec.read_u32()?;
        let encoding = dec.read_u32()?;
        Ok(GenericHeader { release, encoding })
    }

    /// Checks the header against the codec release this process speaks. Never attempts
    /// a best-effort decode on mismatch (§4.1).
    pub fn check(&self, expected_release: u32) -> Result<(), PvfsError> {
        if self.release != expected_release || self.encoding != ENCODING_LE_BYTEFIELD {
            Err(PvfsError::Unsupported {
                observed_release: self.release,
                observed_encoding: self.encoding,
            })
        } else {
            Ok(())
        }
    }
}
