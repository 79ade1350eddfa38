//! Constant tables from ISO/IEC 18004.
//!
//! Per-version tables are indexed by `version` directly; index 0 is a
//! placeholder so that `TABLE[ecl][version]` reads naturally.

/// Side length of a finder pattern.
pub const FINDER_PATTERN_SIZE: usize = 7;

/// Side length of an alignment pattern.
pub const ALIGNMENT_PATTERN_SIZE: usize = 5;

/// Width of the mode indicator in bits.
pub const MODE_INDICATOR_BITS: usize = 4;

/// Pad codewords appended alternately after the terminator.
pub const PAD_CODEWORDS: [u8; 2] = [0xec, 0x11];

/// Highest version of each character-count-indicator regime.
pub const CHARACTER_COUNT_MAX_VERSION: [u8; 3] = [9, 26, 40];

/// Number of alignment patterns, indexed by `version / 7`.
pub const ALIGNMENT_PATTERN_TOTALS: [usize; 6] = [1, 6, 13, 22, 33, 46];

/// Spacing between inner alignment pattern centres, indexed by `version - 1`.
pub const ALIGNMENT_PATTERN_DIFFS: [usize; 40] = [
    0, 12, 16, 20, 24, 28, 16, 18, 20, 22, 24, 26, 28, 20, 22, 24, 24, 26, 28, 28, 22, 24, 24, 26,
    26, 28, 28, 24, 24, 26, 26, 26, 28, 28, 24, 26, 26, 26, 28, 28,
];

pub static ECC_CODEWORDS_PER_BLOCK: [[i8; 41]; 4] = [
    [
        -1, 7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28, 28, 28, 30,
        30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Low
    [
        -1, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26, 26, 28, 28,
        28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    ], // Medium
    [
        -1, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30, 28, 30, 30,
        30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Quartile
    [
        -1, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28, 30, 24, 30,
        30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // High
];

pub static NUM_ERROR_CORRECTION_BLOCKS: [[i8; 41]; 4] = [
    [
        -1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8, 8, 9, 9, 10, 12, 12, 12,
        13, 14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25,
    ], // Low
    [
        -1, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16, 17, 17, 18, 20, 21,
        23, 25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49,
    ], // Medium
    [
        -1, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20, 23, 23, 25, 27, 29,
        34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68,
    ], // Quartile
    [
        -1, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25, 25, 34, 30, 32, 35,
        37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81,
    ], // High
];

/// Total codewords (data + error correction) per version, indexed by `version - 1`.
pub const CODEWORDS: [usize; 40] = [
    26, 44, 70, 100, 134, 172, 196, 242, 292, 346, 404, 466, 532, 581, 655, 733, 815, 901, 991,
    1085, 1156, 1258, 1364, 1474, 1588, 1706, 1828, 1921, 2051, 2185, 2323, 2465, 2611, 2761,
    2876, 3034, 3196, 3362, 3532, 3706,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codewords_match_block_tables() {
        for ver in 1..=40usize {
            for ecl in 0..4 {
                let blocks = NUM_ERROR_CORRECTION_BLOCKS[ecl][ver] as usize;
                let per_block = ECC_CODEWORDS_PER_BLOCK[ecl][ver] as usize;
                assert!(blocks * per_block < CODEWORDS[ver - 1]);
            }
        }
    }
}
