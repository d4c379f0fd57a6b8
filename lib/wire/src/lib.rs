//! The wire codec (§4.1): a fixed 8-byte generic header followed by a little-endian
//! bytefield body, covering the request/response payloads this engine gives full
//! typed fidelity to. Grounded in `net::frame`'s and `flux::contract`'s manual
//! encode/decode style rather than a derive-based serializer.

pub mod codec;
pub mod header;
pub mod request;
pub mod response;

use codec::{Decoder, Encoder};
use header::GenericHeader;
use lazy_static::lazy_static;
use pvfs_types::{PvfsError, RequestTag};
use std::collections::HashMap;

pub use request::{canonical_maximal as request_canonical_maximal, canonical_minimal as request_canonical_minimal, RequestBody, ServerMode};
pub use response::{
    canonical_maximal as response_canonical_maximal, canonical_minimal as response_canonical_minimal, DirEntry, ResponseBody,
};

/// The protocol release this codec speaks. Bumped whenever the wire layout changes
/// incompatibly; `GenericHeader::check` rejects anything else (§4.1, §6).
pub const PROTOCOL_RELEASE: u32 = 1;

/// Precomputed per-tag maximum encoded body size (header excluded), derived once from
/// a canonical-maximal instance of each covered operation. A separate canonical-minimal
/// instance is used at startup to self-verify every covered op actually fits its bound
/// (`self_test`); nothing here depends on run time values, so both tables are `lazy_static`.
fn build_request_size_table() -> HashMap<RequestTag, usize> {
    let mut table = HashMap::new();
    for code in 0u32..=51u32 {
        let tag = RequestTag::from_wire(code).expect("closed tag set is exhaustive 0..=51");
        if let Some(body) = request::canonical_maximal(tag) {
            let mut enc = Encoder::with_capacity(256);
            body.encode(&mut enc);
            table.insert(tag, enc.len());
        }
    }
    table
}

fn build_response_size_table() -> HashMap<RequestTag, usize> {
    let mut table = HashMap::new();
    for code in 0u32..=51u32 {
        let tag = RequestTag::from_wire(code).expect("closed tag set is exhaustive 0..=51");
        if let Some(body) = response::canonical_maximal(tag) {
            let mut enc = Encoder::with_capacity(256);
            body.encode(&mut enc);
            table.insert(tag, enc.len());
        }
    }
    table
}

lazy_static! {
    static ref REQUEST_MAX_SIZE: HashMap<RequestTag, usize> = build_request_size_table();
    static ref RESPONSE_MAX_SIZE: HashMap<RequestTag, usize> = build_response_size_table();
}

/// Which direction a message travels; `max_encoded_size` takes this because request
/// and response bodies for the same tag are sized independently.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Direction {
    Request,
    Response,
}

/// The maximum encoded body size (header excluded) for `tag` in `direction`, or `None`
/// for tags this codec does not give a typed payload to.
pub fn max_encoded_size(direction: Direction, tag: RequestTag) -> Option<usize> {
    match direction {
        Direction::Request => REQUEST_MAX_SIZE.get(&tag).copied(),
        Direction::Response => RESPONSE_MAX_SIZE.get(&tag).copied(),
    }
    .map(|size| GenericHeader::SIZE + size)
}

/// Encodes a request to a full wire message: header followed by body.
pub fn encode_request(body: &RequestBody) -> Vec<u8> {
    let mut enc = Encoder::with_capacity(256);
    GenericHeader::new(PROTOCOL_RELEASE).encode(&mut enc);
    body.encode(&mut enc);
    enc.finish()
}

/// Decodes a full wire message into its tag and typed request body. Checks the header
/// first and returns `Unsupported` on any release/encoding mismatch without attempting
/// a best-effort decode of the body (§4.1).
pub fn decode_request(tag: RequestTag, buf: &[u8]) -> Result<RequestBody, PvfsError> {
    let mut dec = Decoder::new(buf);
    let header = GenericHeader::decode(&mut dec)?;
    header.check(PROTOCOL_RELEASE)?;
    let body = RequestBody::decode(tag, &mut dec)?;
    dec.finish()?;
    Ok(body)
}

/// Encodes a response to a full wire message: header followed by body.
pub fn encode_response(body: &ResponseBody) -> Vec<u8> {
    let mut enc = Encoder::with_capacity(256);
    GenericHeader::new(PROTOCOL_RELEASE).encode(&mut enc);
    body.encode(&mut enc);
    enc.finish()
}

/// Decodes a full wire message into its typed response body for `tag`.
pub fn decode_response(tag: RequestTag, buf: &[u8]) -> Result<ResponseBody, PvfsError> {
    let mut dec = Decoder::new(buf);
    let header = GenericHeader::decode(&mut dec)?;
    header.check(PROTOCOL_RELEASE)?;
    let body = ResponseBody::decode(tag, &mut dec)?;
    dec.finish()?;
    Ok(body)
}

/// Startup self-test (§4.1: "this also verifies the per-op budget"): encodes a
/// canonical-minimal instance of every covered op and asserts it fits the precomputed
/// maximum for a canonical-maximal instance of the same op. Called once from the
/// daemon's init sequence; a failure here is a codec programming error, not a runtime
/// condition, so it panics rather than returning a `Result`.
pub fn self_test() {
    for code in 0u32..=51u32 {
        let tag = RequestTag::from_wire(code).expect("closed tag set is exhaustive 0..=51");
        if let Some(body) = request::canonical_minimal(tag) {
            let mut enc = Encoder::with_capacity(256);
            body.encode(&mut enc);
            let max = max_encoded_size(Direction::Request, tag).expect("covered tag has a size entry");
            assert!(
                GenericHeader::SIZE + enc.len() <= max,
                "request {:?} minimal encoding {} exceeds budget {}",
                tag,
                GenericHeader::SIZE + enc.len(),
                max
            );
        }
        if let Some(body) = response::canonical_minimal(tag) {
            let mut enc = Encoder::with_capacity(256);
            body.encode(&mut enc);
            let max = max_encoded_size(Direction::Response, tag).expect("covered tag has a size entry");
            assert!(
                GenericHeader::SIZE + enc.len() <= max,
                "response {:?} minimal encoding {} exceeds budget {}",
                tag,
                GenericHeader::SIZE + enc.len(),
                max
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pvfs_types::Capability;
    use request::{CreateRequest, RequestBody};

    #[test]
    fn self_test_passes_for_every_covered_tag() {
        self_test();
    }

    #[test]
    fn create_request_round_trips() {
        let body = RequestBody::Create(CreateRequest {
            fsid: pvfs_types::FsId(1),
            object_type: 2,
            num_dfiles_req: 4,
            capability: Capability::new(1, vec![1, 2, 3], 999, 0xf, vec![]),
        });
        let wire = encode_request(&body);
        let decoded = decode_request(RequestTag::Create, &wire).unwrap();
        assert_eq!(decoded, body);
    }

    #[test]
    fn decode_rejects_unsupported_release() {
        let body = RequestBody::MgmtNoop(request::MgmtNoopRequest {});
        let mut wire = encode_request(&body);
        wire[0] = 0xff;
        let err = decode_request(RequestTag::MgmtNoop, &wire).unwrap_err();
        assert!(matches!(err, PvfsError::Unsupported { .. }));
    }

    #[test]
    fn decode_rejects_reserved_tag() {
        assert!(matches!(
            decode_request(RequestTag::JobTimer, &encode_request(&RequestBody::MgmtNoop(request::MgmtNoopRequest {}))),
            Err(PvfsError::Protocol)
        ));
    }

    #[test]
    fn max_encoded_size_bounds_both_directions() {
        let req_max = max_encoded_size(Direction::Request, RequestTag::Create).unwrap();
        let resp_max = max_encoded_size(Direction::Response, RequestTag::Create).unwrap();
        assert!(req_max > header::GenericHeader::SIZE);
        assert!(resp_max > header::GenericHeader::SIZE);
        assert!(max_encoded_size(Direction::Request, RequestTag::JobTimer).is_none());
    }
}
