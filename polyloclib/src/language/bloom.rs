//! Byte pre-filter used by the code state.
//!
//! Each byte value maps to a 64-bit word with exactly three bits set. A
//! language's mask is the union of the words for the first byte of every
//! token it recognises. A byte can only start a token when all three of its
//! bits are present in the mask, so a failed test is a guaranteed miss and a
//! passed test still needs a full trie match.
//!
//! Raw byte values are first scrambled with splitmix64 because source text
//! clusters in a narrow ASCII range and the bit positions would otherwise
//! collide.

/// Number of bits set per byte.
const BITS_PER_BYTE: u32 = 3;

/// Precomputed [`bloom_hash`] for every byte value.
pub const BLOOM_TABLE: [u64; 256] = build_table();

const fn splitmix64(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Three-bit bloom word for a single byte.
pub const fn bloom_hash(byte: u8) -> u64 {
    let mut random = splitmix64(byte as u64);
    let mut mask = 0u64;
    let mut set = 0;
    let mut shift = 0;

    while set < BITS_PER_BYTE {
        let bit = (random >> shift) & 0x3f;
        shift += 6;
        if shift > 58 {
            random = splitmix64(random);
            shift = 0;
        }
        if mask & (1 << bit) == 0 {
            mask |= 1 << bit;
            set += 1;
        }
    }

    mask
}

const fn build_table() -> [u64; 256] {
    let mut table = [0u64; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = bloom_hash(i as u8);
        i += 1;
    }
    table
}

/// Per-language union of token first-byte hashes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BloomFilter {
    pub process_bytes_mask: u64,
}

impl BloomFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a byte that may start a token.
    pub fn insert(&mut self, byte: u8) {
        self.process_bytes_mask |= BLOOM_TABLE[byte as usize];
    }

    /// Could `byte` begin any token of this language?
    #[inline]
    pub fn should_process(&self, byte: u8) -> bool {
        let k = BLOOM_TABLE[byte as usize];
        k & self.process_bytes_mask == k
    }
}
