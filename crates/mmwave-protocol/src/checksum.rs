//! Frame checksum: the bitwise complement of the XOR of all covered bytes.

/// Compute the checksum of a byte range.
pub fn checksum(bytes: &[u8]) -> u8 {
    !bytes.iter().fold(0u8, |acc, byte| acc ^ byte)
}

/// Check a byte range against the checksum carried in the frame.
pub fn validate_checksum(bytes: &[u8], expected: u8) -> bool {
    checksum(bytes) == expected
}
