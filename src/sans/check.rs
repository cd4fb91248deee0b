//! Helper for computing cyclic redundancy checks.
//!
//! Stream frames are protected by CRC-16/ARC (also known as CRC-16-IBM): the
//! reflected polynomial `0xA001`, an initial value of zero and no final xor.

/// Reflected CRC-16/ARC polynomial.
const POLYNOMIAL: u16 = 0xA001;

/// Accumulate a slice of bytes into a cyclic redundancy check value.
///
/// Pass `0` as `init` to start a new check.
pub fn compute_crc(init: u16, r: &[u8]) -> u16 {
    r.iter().fold(init, |acc, b| crc_byte(acc, *b))
}

/// Accumulate a single byte into a cyclic redundancy check value, least
/// significant bit first.
fn crc_byte(crc: u16, b: u8) -> u16 {
    (0..8).fold(crc ^ u16::from(b), |crc, _| {
        if crc & 1 != 0 {
            (crc >> 1) ^ POLYNOMIAL
        } else {
            crc >> 1
        }
    })
}
