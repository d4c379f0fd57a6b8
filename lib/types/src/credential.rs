use crate::handle::Handle;

/// Maximum number of groups a credential may carry (§6 size limit).
pub const MAX_GROUPS: usize = 32;
/// Maximum signature length in bytes (§6 size limit).
pub const MAX_SIGNATURE: usize = 256;
/// Maximum number of handles a capability may authorize in one message (§6).
pub const MAX_HANDLES: usize = 1024;

/// Binds a user id, group set, issuer and validity deadline, with a detached signature
/// over those fields. Field shapes follow `original_source/src/apps/admin/pvfs2-gencred.c`
/// (§3, [SUPPLEMENT] in SPEC_FULL.md). Built only through `Credential::new`, per the
/// "one constructor per variant" design note — callers never assemble a `Credential` by
/// mutating fields after the fact.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Credential {
    pub userid: u32,
    pub group_array: Vec<u32>,
    pub issuer: String,
    pub timeout: i64,
    pub signature: Vec<u8>,
}

impl Credential {
    pub fn new(
        userid: u32,
        group_array: Vec<u32>,
        issuer: String,
        timeout: i64,
        signature: Vec<u8>,
    ) -> Credential {
        Credential {
            userid,
            group_array,
            issuer,
            timeout,
            signature,
        }
    }

    /// The byte sequence the signature is computed over; everything but the signature
    /// itself.
    pub fn signable_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(16 + self.issuer.len() + self.group_array.len() * 4);
        buf.extend_from_slice(&self.userid.to_le_bytes());
        buf.extend_from_slice(&self.timeout.to_le_bytes());
        for group in &self.group_array {
            buf.extend_from_slice(&group.to_le_bytes());
        }
        buf.extend_from_slice(self.issuer.as_bytes());
        buf
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.timeout
    }
}

/// Authorizes specific operations on specific handles, derived from a `Credential`.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Capability {
    pub fsid: u32,
    pub signature: Vec<u8>,
    pub timeout: i64,
    pub op_mask: u32,
    pub handle_array: Vec<Handle>,
}

impl Capability {
    pub fn new(fsid: u32, signature: Vec<u8>, timeout: i64, op_mask: u32, handle_array: Vec<Handle>) -> Capability {
        Capability {
            fsid,
            signature,
            timeout,
            op_mask,
            handle_array,
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.timeout
    }

    pub fn authorizes(&self, handle: Handle, op_bit: u32) -> bool {
        (self.op_mask & op_bit) == op_bit && self.handle_array.iter().any(|&h| h == handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signable_bytes_is_stable() {
        let cred = Credential::new(7, vec![1, 2], "C:hostA".into(), 1234, vec![9, 9, 9]);
        let a = cred.signable_bytes();
        let b = cred.signable_bytes();
        assert_eq!(a, b);
    }

    #[test]
    fn capability_authorizes_listed_handle_under_mask() {
        let cap = Capability::new(1, vec![], 0, 0b0101, vec![Handle::new(42)]);
        assert!(cap.authorizes(Handle::new(42), 0b0001));
        assert!(!cap.authorizes(Handle::new(42), 0b0010));
        assert!(!cap.authorizes(Handle::new(43), 0b0001));
    }
}
