//! Manual byte-level encode/decode, in `net::frame::Header::deserialize`'s and
//! `flux::contract::PrivateData::read/write`'s style: explicit `byteorder` calls over a
//! cursor, rather than deriving through `serde`. This crate keeps exact control over the
//! wire layout the codec contract (§4.1) demands.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use pvfs_types::{Capability, Credential, Extent, ExtentArray, FsId, Handle, PvfsError, Sid, SidArray};
use std::io::{Cursor, Read, Write};

/// Rounds `len` up to the next multiple of 8, per the "8-byte aligned after every
/// field-group" encoding rule (§4.1).
#[inline]
pub fn align8(len: usize) -> usize {
    (len + 7) & !7
}

/// Growable write cursor used to build one request/response buffer.
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    #[inline]
    pub fn with_capacity(cap: usize) -> Encoder {
        Encoder { buf: Vec::with_capacity(cap) }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    #[inline]
    pub fn write_u32(&mut self, v: u32) {
        self.buf.write_u32::<LittleEndian>(v).expect("Vec<u8> writes cannot fail");
    }

    #[inline]
    pub fn write_u64(&mut self, v: u64) {
        self.buf.write_u64::<LittleEndian>(v).expect("Vec<u8> writes cannot fail");
    }

    #[inline]
    pub fn write_i32(&mut self, v: i32) {
        self.buf.write_i32::<LittleEndian>(v).expect("Vec<u8> writes cannot fail");
    }

    #[inline]
    pub fn write_i64(&mut self, v: i64) {
        self.buf.write_i64::<LittleEndian>(v).expect("Vec<u8> writes cannot fail");
    }

    #[inline]
    pub fn write_handle(&mut self, h: Handle) {
        self.write_u64(h.0);
    }

    #[inline]
    pub fn write_fsid(&mut self, f: FsId) {
        self.write_u32(f.0);
    }

    #[inline]
    pub fn write_sid(&mut self, s: Sid) {
        self.write_u32(s.0);
    }

    #[inline]
    pub fn write_bytes_raw(&mut self, bytes: &[u8]) {
        self.buf.write_all(bytes).expect("Vec<u8> writes cannot fail");
    }

    /// Pads the buffer out to the next multiple of 8 with zero bytes.
    #[inline]
    pub fn pad_align8(&mut self) {
        let target = align8(self.buf.len());
        self.buf.resize(target, 0);
    }

    /// Writes a length-prefixed byte blob: 4-byte count, then bytes, padded to 8.
    #[inline]
    pub fn write_blob(&mut self, bytes: &[u8]) {
        self.write_u32(bytes.len() as u32);
        self.write_bytes_raw(bytes);
        self.pad_align8();
    }

    /// Writes a string per the encoding rule: 4-byte length including the NUL
    /// terminator, then the bytes and terminator, padded to 8.
    #[inline]
    pub fn write_string(&mut self, s: &str) {
        self.write_u32((s.len() + 1) as u32);
        self.write_bytes_raw(s.as_bytes());
        self.write_u8(0);
        self.pad_align8();
    }

    #[inline]
    pub fn write_sid_array(&mut self, sids: &SidArray) {
        self.write_u32(sids.len() as u32);
        for &sid in &sids.sids {
            self.write_sid(sid);
        }
        self.pad_align8();
    }

    #[inline]
    pub fn write_handle_array(&mut self, handles: &[Handle]) {
        self.write_u32(handles.len() as u32);
        for &h in handles {
            self.write_handle(h);
        }
        self.pad_align8();
    }

    #[inline]
    pub fn write_extent_array(&mut self, extents: &ExtentArray) {
        self.write_u32(extents.extents.len() as u32);
        for extent in &extents.extents {
            self.write_handle(extent.first);
            self.write_handle(extent.last);
        }
    }

    pub fn write_credential(&mut self, cred: &Credential) {
        self.write_u32(cred.userid);
        self.write_i64(cred.timeout);
        self.write_u32(cred.group_array.len() as u32);
        for &group in &cred.group_array {
            self.write_u32(group);
        }
        self.pad_align8();
        self.write_string(&cred.issuer);
        self.write_blob(&cred.signature);
    }

    pub fn write_capability(&mut self, cap: &Capability) {
        self.write_u32(cap.fsid);
        self.write_i64(cap.timeout);
        self.write_u32(cap.op_mask);
        self.write_handle_array(&cap.handle_array);
        self.write_blob(&cap.signature);
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Read cursor over a borrowed byte slice. Decoded owned values (strings, handle
/// arrays) are copied out of the slice rather than pointing back into it, per the
/// "represent decoded values as owned containers" re-architecture in §9's Design
/// Notes; the cursor itself borrows so no copy happens until a field is actually
/// materialized.
pub struct Decoder<'a> {
    cursor: Cursor<&'a [u8]>,
    len: usize,
}

impl<'a> Decoder<'a> {
    #[inline]
    pub fn new(buf: &'a [u8]) -> Decoder<'a> {
        Decoder {
            cursor: Cursor::new(buf),
            len: buf.len(),
        }
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.len - self.cursor.position() as usize
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, PvfsError> {
        self.cursor.read_u8().map_err(|_| PvfsError::Protocol)
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32, PvfsError> {
        self.cursor.read_u32::<LittleEndian>().map_err(|_| PvfsError::Protocol)
    }

    #[inline]
    pub fn read_u64(&mut self) -> Result<u64, PvfsError> {
        self.cursor.read_u64::<LittleEndian>().map_err(|_| PvfsError::Protocol)
    }

    #[inline]
    pub fn read_i32(&mut self) -> Result<i32, PvfsError> {
        self.cursor.read_i32::<LittleEndian>().map_err(|_| PvfsError::Protocol)
    }

    #[inline]
    pub fn read_i64(&mut self) -> Result<i64, PvfsError> {
        self.cursor.read_i64::<LittleEndian>().map_err(|_| PvfsError::Protocol)
    }

    #[inline]
    pub fn read_handle(&mut self) -> Result<Handle, PvfsError> {
        Ok(Handle(self.read_u64()?))
    }

    #[inline]
    pub fn read_fsid(&mut self) -> Result<FsId, PvfsError> {
        Ok(FsId(self.read_u32()?))
    }

    #[inline]
    pub fn read_sid(&mut self) -> Result<Sid, PvfsError> {
        Ok(Sid(self.read_u32()?))
    }

    #[inline]
    pub fn read_exact_bytes(&mut self, n: usize) -> Result<Vec<u8>, PvfsError> {
        if self.remaining() < n {
            return Err(PvfsError::Protocol);
        }
        let mut out = vec![0u8; n];
        self.cursor.read_exact(&mut out).map_err(|_| PvfsError::Protocol)?;
        Ok(out)
    }

    #[inline]
    pub fn align8(&mut self) -> Result<(), PvfsError> {
        let pos = self.cursor.position() as usize;
        let target = align8(pos);
        let skip = target - pos;
        if skip > 0 {
            self.read_exact_bytes(skip)?;
        }
        Ok(())
    }

    pub fn read_blob(&mut self, max_len: usize) -> Result<Vec<u8>, PvfsError> {
        let count = self.read_u32()? as usize;
        if count > max_len {
            return Err(PvfsError::Protocol);
        }
        let out = self.read_exact_bytes(count)?;
        self.align8()?;
        Ok(out)
    }

    pub fn read_string(&mut self, max_len: usize) -> Result<String, PvfsError> {
        let count = self.read_u32()? as usize;
        if count == 0 || count > max_len + 1 {
            return Err(PvfsError::Protocol);
        }
        let raw = self.read_exact_bytes(count)?;
        self.align8()?;
        if raw[count - 1] != 0 {
            return Err(PvfsError::Protocol);
        }
        String::from_utf8(raw[..count - 1].to_vec()).map_err(|_| PvfsError::Protocol)
    }

    pub fn read_sid_array(&mut self, max_len: usize) -> Result<SidArray, PvfsError> {
        let count = self.read_u32()? as usize;
        if count > max_len {
            return Err(PvfsError::Protocol);
        }
        let mut sids = Vec::with_capacity(count);
        for _ in 0..count {
            sids.push(self.read_sid()?);
        }
        self.align8()?;
        Ok(SidArray::new(sids))
    }

    pub fn read_handle_array(&mut self, max_len: usize) -> Result<Vec<Handle>, PvfsError> {
        let count = self.read_u32()? as usize;
        if count > max_len {
            return Err(PvfsError::Protocol);
        }
        let mut handles = Vec::with_capacity(count);
        for _ in 0..count {
            handles.push(self.read_handle()?);
        }
        self.align8()?;
        Ok(handles)
    }

    pub fn read_extent_array(&mut self, max_len: usize) -> Result<ExtentArray, PvfsError> {
        let count = self.read_u32()? as usize;
        if count > max_len {
            return Err(PvfsError::Protocol);
        }
        let mut extents = Vec::with_capacity(count);
        for _ in 0..count {
            let first = self.read_handle()?;
            let last = self.read_handle()?;
            extents.push(Extent::new(first, last));
        }
        Ok(ExtentArray::new(extents))
    }

    pub fn read_credential(&mut self) -> Result<Credential, PvfsError> {
        use pvfs_types::limits;

        let userid = self.read_u32()?;
        let timeout = self.read_i64()?;
        let group_count = self.read_u32()? as usize;
        if group_count > limits::MAX_GROUPS {
            return Err(PvfsError::Protocol);
        }
        let mut group_array = Vec::with_capacity(group_count);
        for _ in 0..group_count {
            group_array.push(self.read_u32()?);
        }
        self.align8()?;
        let issuer = self.read_string(limits::MAX_SEGMENT)?;
        let signature = self.read_blob(limits::MAX_SIGNATURE)?;
        Ok(Credential::new(userid, group_array, issuer, timeout, signature))
    }

    pub fn read_capability(&mut self) -> Result<Capability, PvfsError> {
        use pvfs_types::limits;

        let fsid = self.read_u32()?;
        let timeout = self.read_i64()?;
        let op_mask = self.read_u32()?;
        let handle_array = self.read_handle_array(limits::MAX_HANDLES)?;
        let signature = self.read_blob(limits::MAX_SIGNATURE)?;
        Ok(Capability::new(fsid, signature, timeout, op_mask, handle_array))
    }

    /// Consumes the decoder, failing if any bytes remain unconsumed (§4.1: "the decoder
    /// consumes the whole buffer and fails... if bytes remain").
    pub fn finish(self) -> Result<(), PvfsError> {
        if self.remaining() != 0 {
            Err(PvfsError::Protocol)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_round_trips_with_padding() {
        let mut enc = Encoder::with_capacity(64);
        enc.write_string("C:hostA");
        let buf = enc.finish();
        assert_eq!(buf.len() % 8, 0);

        let mut dec = Decoder::new(&buf);
        let s = dec.read_string(256).unwrap();
        assert_eq!(s, "C:hostA");
        dec.finish().unwrap();
    }

    #[test]
    fn credential_round_trips() {
        let cred = Credential::new(7, vec![1, 2, 3], "C:hostA".into(), 99, vec![5, 6, 7, 8]);
        let mut enc = Encoder::with_capacity(128);
        enc.write_credential(&cred);
        let buf = enc.finish();

        let mut dec = Decoder::new(&buf);
        let decoded = dec.read_credential().unwrap();
        dec.finish().unwrap();

        assert_eq!(decoded, cred);
    }

    #[test]
    fn decode_fails_on_trailing_bytes() {
        let mut enc = Encoder::with_capacity(16);
        enc.write_u32(1);
        let mut buf = enc.finish();
        buf.extend_from_slice(&[0u8; 8]);

        let mut dec = Decoder::new(&buf);
        let _ = dec.read_u32().unwrap();
        assert_eq!(dec.finish().unwrap_err(), PvfsError::Protocol);
    }
}
