use alloy::primitives::{keccak256, Address, B256, U256};
use sha2::{Digest, Sha256};

/// Domain tag for consumption-secret commitments.
const DOMAIN_SECRET: &[u8] = b"bridge.secret";

/// SHA-256 digest reduced into the rollup's field.
///
/// The most significant byte is cleared, so the result always fits a 254-bit
/// field element. Every message hash, content hash, secret hash, and tree
/// node in the bridge uses this primitive.
pub fn sha256_to_field(data: &[u8]) -> B256 {
    let digest = Sha256::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out[0] = 0;
    B256::from(out)
}

/// Hash two field elements into one (used for Merkle tree nodes).
pub fn sha256_to_field_pair(left: B256, right: B256) -> B256 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(left.as_slice());
    buf[32..].copy_from_slice(right.as_slice());
    sha256_to_field(&buf)
}

/// Commitment to a consumption secret. Registering the hash at deposit time
/// and revealing the preimage at claim time is what gates message
/// consumption.
pub fn compute_secret_hash(secret: B256) -> B256 {
    let mut buf = Vec::with_capacity(DOMAIN_SECRET.len() + 32);
    buf.extend_from_slice(DOMAIN_SECRET);
    buf.extend_from_slice(secret.as_slice());
    sha256_to_field(&buf)
}

/// 4-byte selector for a canonical function signature string.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Content hash over a selector and 32-byte-word arguments.
///
/// The receiving layer rebuilds the same digest from the operation it
/// expects, so a message only matches the exact target function and
/// argument tuple it was emitted for.
pub fn content_hash(selector: [u8; 4], words: &[B256]) -> B256 {
    let mut buf = Vec::with_capacity(4 + 32 * words.len());
    buf.extend_from_slice(&selector);
    for word in words {
        buf.extend_from_slice(word.as_slice());
    }
    sha256_to_field(&buf)
}

/// Pack an L1 address into a 32-byte word (left-padded).
pub fn address_word(address: Address) -> B256 {
    B256::left_padding_from(address.as_slice())
}

/// Pack an amount into a 32-byte word.
pub fn amount_word(amount: U256) -> B256 {
    amount.into()
}

/// Pack a u64 into a 32-byte word.
pub fn u64_word(value: u64) -> B256 {
    U256::from(value).into()
}

/// A random field-safe secret (top byte cleared).
pub fn random_secret() -> B256 {
    use rand::Rng;
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes[1..]);
    B256::from(bytes)
}
