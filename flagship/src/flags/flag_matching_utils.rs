use sha1::{Digest, Sha1};

/// Calculates a deterministic hash for an identity string.
///
/// This function uses SHA1 to generate a digest, then takes the first 8 bytes
/// big-endian and shifts right by 4 bits - equivalent to interpreting the
/// first 15 hex characters of the digest. The result is stable across
/// processes and platforms for the same input. Bucketing only needs speed and
/// uniform low-order bits, not collision resistance.
pub fn calculate_hash(input: &str) -> u64 {
    let digest = Sha1::digest(input.as_bytes());
    u64::from_be_bytes(digest[..8].try_into().unwrap()) >> 4
}

/// Maps an identity string onto a stable bucket in [0, 100).
pub fn bucket(input: &str) -> u64 {
    calculate_hash(input) % 100
}
