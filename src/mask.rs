//! Mask patterns and the penalty rules used to pick one.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::trace;

use crate::matrix::ModuleMatrix;
use crate::qrcode::QrCodeEcc;

const PENALTY_N1: u32 = 3;
const PENALTY_N2: u32 = 3;
const PENALTY_N3: u32 = 40;
const PENALTY_N4: u32 = 10;

const FINDER_LIKE: [bool; 11] = [
    true, false, true, true, true, false, true, false, false, false, false,
];
const FINDER_LIKE_REVERSED: [bool; 11] = [
    false, false, false, false, true, false, true, true, true, false, true,
];

/// A mask pattern (0–7).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Mask(u8);

impl Mask {
    /// Creates a mask object from the given number.
    ///
    /// # Panics
    ///
    /// Panics if the number is outside the range [0, 7].
    pub const fn new(mask: u8) -> Self {
        assert!(mask <= 7, "Mask value out of range");
        Self(mask)
    }

    /// Returns the value, which is in the range [0, 7].
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Whether the module at `row`, `col` is inverted by this mask.
    pub fn invert(self, row: usize, col: usize) -> bool {
        let (i, j) = (row, col);
        match self.0 {
            0 => (i + j) % 2 == 0,
            1 => i % 2 == 0,
            2 => j % 3 == 0,
            3 => (i + j) % 3 == 0,
            4 => (i / 2 + j / 3) % 2 == 0,
            5 => (i * j) % 2 + (i * j) % 3 == 0,
            6 => ((i * j) % 2 + (i * j) % 3) % 2 == 0,
            7 => ((i + j) % 2 + (i * j) % 3) % 2 == 0,
            _ => unreachable!(),
        }
    }
}

/// Scores each of the 8 masks on a copy of `matrix` (with matching format
/// bits drawn) and returns the one with the lowest penalty. Ties go to the
/// lowest mask number.
pub(crate) fn select_mask(matrix: &ModuleMatrix, ecl: QrCodeEcc) -> Mask {
    let evaluate = |m: u8| -> u32 {
        let mask = Mask::new(m);
        let mut candidate = matrix.clone();
        candidate.apply_mask(mask);
        candidate.draw_format_bits(ecl, mask);
        penalty_score(candidate.modules(), candidate.size())
    };

    #[cfg(feature = "parallel")]
    let penalties: Vec<u32> = (0u8..8).into_par_iter().map(evaluate).collect();
    #[cfg(not(feature = "parallel"))]
    let penalties: Vec<u32> = (0u8..8).map(evaluate).collect();

    let mut best = 0u8;
    for (m, &penalty) in (0u8..).zip(&penalties) {
        trace!(mask = m, penalty, "mask candidate");
        if penalty < penalties[usize::from(best)] {
            best = m;
        }
    }
    Mask::new(best)
}

/// Total penalty of a square, row-major module grid.
pub fn penalty_score(modules: &[bool], size: usize) -> u32 {
    run_penalty(modules, size)
        + block_penalty(modules, size)
        + finder_like_penalty(modules, size)
        + balance_penalty(modules)
}

/// Rule 1: every run of five or more same-coloured modules in a row or
/// column scores 3, plus 1 per module beyond five.
pub fn run_penalty(modules: &[bool], size: usize) -> u32 {
    let score_run = |len: usize| -> u32 {
        if len >= 5 {
            PENALTY_N1 + (len - 5) as u32
        } else {
            0
        }
    };
    let mut result = 0;
    for i in 0..size {
        let mut row_color = modules[i * size];
        let mut col_color = modules[i];
        let mut row_run = 0;
        let mut col_run = 0;
        for j in 0..size {
            let row_bit = modules[i * size + j];
            if row_bit == row_color {
                row_run += 1;
            } else {
                result += score_run(row_run);
                row_color = row_bit;
                row_run = 1;
            }
            let col_bit = modules[j * size + i];
            if col_bit == col_color {
                col_run += 1;
            } else {
                result += score_run(col_run);
                col_color = col_bit;
                col_run = 1;
            }
        }
        result += score_run(row_run) + score_run(col_run);
    }
    result
}

/// Rule 2: every 2×2 block of one colour scores 3. Blocks may overlap.
pub fn block_penalty(modules: &[bool], size: usize) -> u32 {
    let mut result = 0;
    for y in 0..size - 1 {
        for x in 0..size - 1 {
            let color = modules[y * size + x];
            if color == modules[y * size + x + 1]
                && color == modules[(y + 1) * size + x]
                && color == modules[(y + 1) * size + x + 1]
            {
                result += PENALTY_N2;
            }
        }
    }
    result
}

/// Rule 3: every occurrence of `10111010000` or `00001011101` in a row or a
/// column scores 40.
pub fn finder_like_penalty(modules: &[bool], size: usize) -> u32 {
    let len = FINDER_LIKE.len();
    if size < len {
        return 0;
    }
    let matches = |get: &dyn Fn(usize) -> bool, pattern: &[bool; 11]| {
        pattern.iter().enumerate().all(|(k, &p)| get(k) == p)
    };
    let mut result = 0;
    for i in 0..size {
        for j in 0..=size - len {
            let row = |k: usize| modules[i * size + j + k];
            let col = |k: usize| modules[(j + k) * size + i];
            if matches(&row, &FINDER_LIKE) || matches(&row, &FINDER_LIKE_REVERSED) {
                result += PENALTY_N3;
            }
            if matches(&col, &FINDER_LIKE) || matches(&col, &FINDER_LIKE_REVERSED) {
                result += PENALTY_N3;
            }
        }
    }
    result
}

/// Rule 4: 10 points for every full 5% step the dark-module ratio sits away
/// from 50%, measured from the nearer multiple of 5%.
pub fn balance_penalty(modules: &[bool]) -> u32 {
    let total = modules.len();
    let dark = modules.iter().filter(|&&m| m).count();
    // floor and ceil of (dark percentage / 5)
    let lower = dark * 20 / total;
    let upper = (dark * 20 + total - 1) / total;
    let k = lower.abs_diff(10).min(upper.abs_diff(10));
    k as u32 * PENALTY_N4
}
