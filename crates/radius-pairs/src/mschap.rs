//! MS-CHAPv2 authenticator response (RFC 2759 Section 8.7 / 8.8)
//!
//! Computes the `S=<40 hex>` success value a server returns to a peer
//! after validating an MS-CHAPv2 response. The 16-byte password-hash-hash
//! input is typically obtained from an external NTLM helper rather than
//! computed locally.

use sha1::{Digest, Sha1};

/// Length of the textual authenticator response: `"S=" + 40 hex`.
pub const AUTH_RESPONSE_LEN: usize = 42;

/// "Magic server to client signing constant" (RFC 2759 Section 8.7)
const MAGIC1: &[u8; 39] = b"Magic server to client signing constant";

/// "Pad to make it do more than one iteration" (RFC 2759 Section 8.7)
const MAGIC2: &[u8; 41] = b"Pad to make it do more than one iteration";

/// ChallengeHash (RFC 2759 Section 8.2): the first 8 bytes of
/// SHA1(PeerChallenge + AuthenticatorChallenge + UserName).
///
/// The user name is the bare name, without any domain prefix.
pub fn challenge_hash(
    peer_challenge: &[u8; 16],
    auth_challenge: &[u8; 16],
    user_name: &str,
) -> [u8; 8] {
    let mut hasher = Sha1::new();
    hasher.update(peer_challenge);
    hasher.update(auth_challenge);
    hasher.update(user_name.as_bytes());
    let digest = hasher.finalize();

    let mut hash = [0u8; 8];
    hash.copy_from_slice(&digest[..8]);
    hash
}

/// GenerateAuthenticatorResponse (RFC 2759 Section 8.7), rendered as the
/// 42-byte `"S=" + 40 uppercase hex` text form of Section 8.8.
///
/// # Arguments
/// * `user_name` - peer identity, without the domain
/// * `nt_hash_hash` - MD4 hash of the NT password hash (e.g. an NT_KEY
///   reported by an NTLM helper)
/// * `nt_response` - the peer's 24-byte NT-Response
/// * `peer_challenge` - the peer's 16-byte challenge
/// * `auth_challenge` - the authenticator's 16-byte challenge
pub fn auth_response(
    user_name: &str,
    nt_hash_hash: &[u8; 16],
    nt_response: &[u8; 24],
    peer_challenge: &[u8; 16],
    auth_challenge: &[u8; 16],
) -> [u8; AUTH_RESPONSE_LEN] {
    let challenge = challenge_hash(peer_challenge, auth_challenge, user_name);

    let mut hasher = Sha1::new();
    hasher.update(nt_hash_hash);
    hasher.update(nt_response);
    hasher.update(MAGIC1);
    let digest = hasher.finalize();

    let mut hasher = Sha1::new();
    hasher.update(digest);
    hasher.update(challenge);
    hasher.update(MAGIC2);
    let digest = hasher.finalize();

    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut response = [0u8; AUTH_RESPONSE_LEN];
    response[0] = b'S';
    response[1] = b'=';
    for (i, byte) in digest.iter().enumerate() {
        response[2 + 2 * i] = HEX[(byte >> 4) as usize];
        response[3 + 2 * i] = HEX[(byte & 0x0f) as usize];
    }
    response
}
