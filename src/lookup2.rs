//! Bob Jenkins' lookup2 hash (1996), the 32-bit hash used for the string table keys.

use byteorder::{ByteOrder, LittleEndian};

/// The golden ratio; an arbitrary value used to seed `a` and `b`.
const GOLDEN_RATIO: u32 = 0x9e37_79b9;

/// Mixes three 32-bit values reversibly.
fn mix(mut a: u32, mut b: u32, mut c: u32) -> (u32, u32, u32) {
    a = a.wrapping_sub(b).wrapping_sub(c) ^ (c >> 13);
    b = b.wrapping_sub(c).wrapping_sub(a) ^ (a << 8);
    c = c.wrapping_sub(a).wrapping_sub(b) ^ (b >> 13);

    a = a.wrapping_sub(b).wrapping_sub(c) ^ (c >> 12);
    b = b.wrapping_sub(c).wrapping_sub(a) ^ (a << 16);
    c = c.wrapping_sub(a).wrapping_sub(b) ^ (b >> 5);

    a = a.wrapping_sub(b).wrapping_sub(c) ^ (c >> 3);
    b = b.wrapping_sub(c).wrapping_sub(a) ^ (a << 10);
    c = c.wrapping_sub(a).wrapping_sub(b) ^ (b >> 15);

    (a, b, c)
}

/// Hashes `key` with the given initial value (the string tables use 0).
pub fn hash(key: &[u8], initval: u32) -> u32 {
    let mut a = GOLDEN_RATIO;
    let mut b = GOLDEN_RATIO;
    let mut c = initval;

    let mut blocks = key.chunks_exact(12);
    for block in &mut blocks {
        a = a.wrapping_add(LittleEndian::read_u32(&block[0..4]));
        b = b.wrapping_add(LittleEndian::read_u32(&block[4..8]));
        c = c.wrapping_add(LittleEndian::read_u32(&block[8..12]));
        let mixed = mix(a, b, c);
        a = mixed.0;
        b = mixed.1;
        c = mixed.2;
    }

    c = c.wrapping_add(key.len() as u32);

    // the lowest byte of c is reserved for the length
    for (index, &byte) in blocks.remainder().iter().enumerate() {
        let byte = byte as u32;
        match index {
            0..=3 => a = a.wrapping_add(byte << (8 * index)),
            4..=7 => b = b.wrapping_add(byte << (8 * (index - 4))),
            _ => c = c.wrapping_add(byte << (8 * (index - 7))),
        }
    }

    mix(a, b, c).2
}
