//! Credential/capability signing (§3, [SUPPLEMENT] in SPEC_FULL.md). The original
//! `pvfs2-gencred` signs with an OpenSSL private key over SHA1; reproducing PEM/EVP_Sign
//! byte-for-byte is out of scope (§1 Non-goals), so this is a simplified keyed hash:
//! `SHA256(key || message)`. Good enough to give `gencred`/`Credential::new` a real
//! signature to carry, not a drop-in replacement for asymmetric signing.

use sha2::{Digest, Sha256};

/// Computes the keyed-hash signature of `message` under `key`.
pub fn sign(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(key);
    hasher.update(message);
    hasher.finalize().to_vec()
}

/// Recomputes the signature and compares, in constant time, against `signature`.
pub fn verify(key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    let expected = sign(key, message);
    if expected.len() != signature.len() {
        return false;
    }
    let mut diff = 0u8;
    for (a, b) in expected.iter().zip(signature.iter()) {
        diff |= a ^ b;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_accepts_its_own_signature() {
        let key = b"server-key";
        let message = b"userid=7,issuer=C:hostA";
        let sig = sign(key, message);
        assert!(verify(key, message, &sig));
    }

    #[test]
    fn verify_rejects_a_tampered_message() {
        let key = b"server-key";
        let sig = sign(key, b"userid=7");
        assert!(!verify(key, b"userid=8", &sig));
    }

    #[test]
    fn verify_rejects_the_wrong_key() {
        let sig = sign(b"key-a", b"message");
        assert!(!verify(b"key-b", b"message", &sig));
    }
}
