//! The module grid under construction.
//!
//! [`ModuleMatrix`] owns the flat, row-major module buffer together with a
//! same-sized arena of reserved-bit tags. Every function pattern is written
//! through [`ModuleMatrix::set_function_module`], so a cell is maskable exactly
//! when its tag is `None`.

use crate::mask::Mask;
use crate::qrcode::{QrCodeEcc, Version};
use crate::tables::{
    ALIGNMENT_PATTERN_DIFFS, ALIGNMENT_PATTERN_SIZE, ALIGNMENT_PATTERN_TOTALS, FINDER_PATTERN_SIZE,
};

/// Role of a module that does not carry data or error correction bits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ReservedKind {
    FinderPattern,
    Separator,
    TimingPattern,
    AlignmentPattern,
    FormatInfo,
    VersionInfo,
    DarkModule,
}

/// A reserved module: its role and its final colour.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ReservedBit {
    pub kind: ReservedKind,
    pub dark: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct ModuleMatrix {
    size: usize,
    version: Version,
    modules: Vec<bool>,
    reserved: Vec<Option<ReservedBit>>,
}

impl ModuleMatrix {
    /// Creates a grid with every function pattern of `version` drawn and the
    /// format information area reserved (all light until
    /// [`draw_format_bits`](Self::draw_format_bits)).
    pub fn new(version: Version) -> Self {
        let size = version.size();
        let mut result = Self {
            size,
            version,
            modules: vec![false; size * size],
            reserved: vec![None; size * size],
        };
        result.draw_finder_patterns();
        result.draw_separators();
        result.draw_timing_patterns();
        result.draw_alignment_patterns();
        if version.value() >= 7 {
            result.draw_version_info();
        }
        result.reserve_format_info();
        result.draw_dark_module();
        result
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn modules(&self) -> &[bool] {
        &self.modules
    }

    #[cfg(test)]
    pub fn reserved(&self) -> &[Option<ReservedBit>] {
        &self.reserved
    }

    pub fn into_parts(self) -> (Vec<bool>, Vec<Option<ReservedBit>>) {
        (self.modules, self.reserved)
    }

    fn index(&self, x: usize, y: usize) -> usize {
        assert!(x < self.size && y < self.size, "Module out of range");
        y * self.size + x
    }

    fn set_function_module(&mut self, x: usize, y: usize, kind: ReservedKind, dark: bool) {
        let index = self.index(x, y);
        self.modules[index] = dark;
        self.reserved[index] = Some(ReservedBit { kind, dark });
    }

    /// Draws a square of concentric dark, light and dark rings with a solid
    /// dark centre, as used by finder (7×7) and alignment (5×5) patterns.
    fn fill_block(&mut self, left: usize, top: usize, side: usize, kind: ReservedKind) {
        let half = side / 2;
        for dy in 0..side {
            for dx in 0..side {
                let dist = dx.abs_diff(half).max(dy.abs_diff(half));
                self.set_function_module(left + dx, top + dy, kind, dist != half - 1);
            }
        }
    }

    fn draw_finder_patterns(&mut self) {
        let far = self.size - FINDER_PATTERN_SIZE;
        for (left, top) in [(0, 0), (far, 0), (0, far)] {
            self.fill_block(left, top, FINDER_PATTERN_SIZE, ReservedKind::FinderPattern);
        }
    }

    /// One light module around the inner edges of each finder pattern.
    fn draw_separators(&mut self) {
        let size = self.size;
        let edge = FINDER_PATTERN_SIZE;
        for i in 0..=edge {
            // top-left
            self.set_function_module(i, edge, ReservedKind::Separator, false);
            self.set_function_module(edge, i, ReservedKind::Separator, false);
            // top-right
            self.set_function_module(size - 1 - i, edge, ReservedKind::Separator, false);
            self.set_function_module(size - 1 - edge, i, ReservedKind::Separator, false);
            // bottom-left
            self.set_function_module(i, size - 1 - edge, ReservedKind::Separator, false);
            self.set_function_module(edge, size - 1 - i, ReservedKind::Separator, false);
        }
    }

    fn draw_timing_patterns(&mut self) {
        for i in FINDER_PATTERN_SIZE + 1..self.size - FINDER_PATTERN_SIZE - 1 {
            let dark = i % 2 == 0;
            self.set_function_module(i, 6, ReservedKind::TimingPattern, dark);
            self.set_function_module(6, i, ReservedKind::TimingPattern, dark);
        }
    }

    fn draw_alignment_patterns(&mut self) {
        let positions = alignment_pattern_positions(self.version);
        let (Some(&first), Some(&last)) = (positions.first(), positions.last()) else {
            return;
        };
        let half = ALIGNMENT_PATTERN_SIZE / 2;
        let mut drawn = 0;
        for &y in &positions {
            for &x in &positions {
                if (x == first && y == first) || (x == first && y == last) || (x == last && y == first) {
                    continue;
                }
                self.fill_block(
                    x - half,
                    y - half,
                    ALIGNMENT_PATTERN_SIZE,
                    ReservedKind::AlignmentPattern,
                );
                drawn += 1;
            }
        }
        debug_assert_eq!(drawn, ALIGNMENT_PATTERN_TOTALS[usize::from(self.version.value()) / 7]);
    }

    /// Two copies of the 18-bit version field: 6×3 above the bottom-left
    /// finder and 3×6 left of the top-right finder.
    fn draw_version_info(&mut self) {
        let bits = version_info_bits(self.version.value());
        for i in 0..18usize {
            let dark = get_bit(bits, i);
            let a = self.size - 11 + i % 3;
            let b = i / 3;
            self.set_function_module(a, b, ReservedKind::VersionInfo, dark);
            self.set_function_module(b, a, ReservedKind::VersionInfo, dark);
        }
    }

    fn reserve_format_info(&mut self) {
        for (x, y) in format_info_positions(self.size) {
            self.set_function_module(x, y, ReservedKind::FormatInfo, false);
        }
    }

    fn draw_dark_module(&mut self) {
        let y = self.size - FINDER_PATTERN_SIZE - 1;
        self.set_function_module(FINDER_PATTERN_SIZE + 1, y, ReservedKind::DarkModule, true);
    }

    /// Writes both copies of the 15-bit format field for `ecl` and `mask`.
    pub fn draw_format_bits(&mut self, ecl: QrCodeEcc, mask: Mask) {
        let bits = format_info_bits(ecl, mask);
        for (i, (x, y)) in format_info_positions(self.size).into_iter().enumerate() {
            self.set_function_module(x, y, ReservedKind::FormatInfo, get_bit(bits, i % 15));
        }
    }

    /// Writes codeword bits, most significant first, into every unreserved
    /// module along the two-column zigzag that starts at the bottom-right
    /// corner. Cells left over after the last codeword are remainder bits and
    /// stay light.
    pub fn place_codewords(&mut self, codewords: &[u8]) {
        let size = self.size as isize;
        let total_bits = codewords.len() * 8;
        let mut i: usize = 0;
        let mut upward = true;
        let mut right: isize = size - 1;
        while right >= 1 {
            if right == 6 {
                right = 5;
            }
            for vert in 0..self.size {
                let y = if upward { self.size - 1 - vert } else { vert };
                for j in 0..2 {
                    let x = (right - j) as usize;
                    let index = y * self.size + x;
                    if self.reserved[index].is_some() {
                        continue;
                    }
                    self.modules[index] =
                        i < total_bits && get_bit(u32::from(codewords[i >> 3]), 7 - (i & 7));
                    i += 1;
                }
            }
            upward = !upward;
            right -= 2;
        }
        debug_assert!(i >= total_bits && i - total_bits < 8, "codewords do not fit the grid");
    }

    /// XORs every unreserved module with the mask pattern. Applying the same
    /// mask twice restores the grid.
    pub fn apply_mask(&mut self, mask: Mask) {
        for y in 0..self.size {
            for x in 0..self.size {
                let index = y * self.size + x;
                if self.reserved[index].is_none() && mask.invert(y, x) {
                    self.modules[index] = !self.modules[index];
                }
            }
        }
    }
}

/// Centre coordinates of alignment patterns along one axis; empty for
/// version 1.
pub fn alignment_pattern_positions(version: Version) -> Vec<usize> {
    let ver = usize::from(version.value());
    if ver == 1 {
        return Vec::new();
    }
    let subdivisions = ver / 7;
    let last = version.size() - 7;
    let diff = ALIGNMENT_PATTERN_DIFFS[ver - 1];
    let mut positions = Vec::with_capacity(subdivisions + 2);
    positions.push(6);
    for i in (1..=subdivisions).rev() {
        positions.push(last - i * diff);
    }
    positions.push(last);
    positions
}

/// Module coordinates `(x, y)` of the format field: bits 0-14 of the copy
/// around the top-left finder, then bits 0-14 of the split copy beside the
/// other two finders.
fn format_info_positions(size: usize) -> Vec<(usize, usize)> {
    let mut positions = Vec::with_capacity(30);
    for i in 0..6 {
        positions.push((8, i));
    }
    positions.push((8, 7));
    positions.push((8, 8));
    positions.push((7, 8));
    for i in 9..15 {
        positions.push((14 - i, 8));
    }
    for i in 0..8 {
        positions.push((size - 1 - i, 8));
    }
    for i in 8..15 {
        positions.push((8, size - 15 + i));
    }
    positions
}

/// The 18-bit version field: 6 version bits followed by 12 BCH bits
/// (generator 0x1F25).
pub fn version_info_bits(version: u8) -> u32 {
    let ver = u32::from(version);
    let mut rem: u32 = ver;
    for _ in 0..12 {
        rem = (rem << 1) ^ ((rem >> 11) * 0x1f25);
    }
    (ver << 12) | rem
}

/// The 15-bit format field: 2 level bits and 3 mask bits followed by
/// 10 BCH bits (generator 0x537), XORed with 0x5412.
pub fn format_info_bits(ecl: QrCodeEcc, mask: Mask) -> u32 {
    let data = u32::from((ecl.format_bits() << 3) | mask.value());
    let mut rem: u32 = data;
    for _ in 0..10 {
        rem = (rem << 1) ^ ((rem >> 9) * 0x537);
    }
    ((data << 10) | rem) ^ 0x5412
}

fn get_bit(x: u32, i: usize) -> bool {
    ((x >> i) & 1) != 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::CODEWORDS;

    fn count_kind(matrix: &ModuleMatrix, kind: ReservedKind) -> usize {
        matrix
            .reserved()
            .iter()
            .filter(|r| r.map_or(false, |r| r.kind == kind))
            .count()
    }

    /// Data modules available in a version, per the closed-form count.
    fn num_raw_data_modules(ver: usize) -> usize {
        let mut result: usize = (16 * ver + 128) * ver + 64;
        if ver >= 2 {
            let numalign: usize = ver / 7 + 2;
            result -= (25 * numalign - 10) * numalign - 55;
            if ver >= 7 {
                result -= 36;
            }
        }
        result
    }

    #[test]
    fn test_version_info_bits() {
        assert_eq!(version_info_bits(7), 0x07c94);
        assert_eq!(version_info_bits(40), 0x28c69);
    }

    #[test]
    fn test_format_info_bits() {
        assert_eq!(format_info_bits(QrCodeEcc::Medium, Mask::new(0)), 0x5412);
        assert_eq!(format_info_bits(QrCodeEcc::Low, Mask::new(0)), 0x77c4);
        assert_eq!(format_info_bits(QrCodeEcc::High, Mask::new(7)), 0x083b);
    }

    #[test]
    fn test_alignment_positions() {
        assert!(alignment_pattern_positions(Version::new(1)).is_empty());
        assert_eq!(alignment_pattern_positions(Version::new(2)), vec![6, 18]);
        assert_eq!(alignment_pattern_positions(Version::new(7)), vec![6, 22, 38]);
        assert_eq!(
            alignment_pattern_positions(Version::new(32)),
            vec![6, 34, 60, 86, 112, 138]
        );
        assert_eq!(
            alignment_pattern_positions(Version::new(40)),
            vec![6, 30, 58, 86, 114, 142, 170]
        );
    }

    #[test]
    fn test_alignment_pattern_counts() {
        for ver in 2..=40u8 {
            let matrix = ModuleMatrix::new(Version::new(ver));
            let count = count_kind(&matrix, ReservedKind::AlignmentPattern);
            let expected = ALIGNMENT_PATTERN_TOTALS[usize::from(ver) / 7] * 25;
            assert_eq!(count, expected, "version {ver}");
        }
    }

    #[test]
    fn test_version_1_layout() {
        let matrix = ModuleMatrix::new(Version::new(1));
        assert_eq!(matrix.size(), 21);
        assert_eq!(count_kind(&matrix, ReservedKind::FinderPattern), 3 * 49);
        assert_eq!(count_kind(&matrix, ReservedKind::Separator), 3 * 15);
        assert_eq!(count_kind(&matrix, ReservedKind::TimingPattern), 10);
        assert_eq!(count_kind(&matrix, ReservedKind::FormatInfo), 30);
        assert_eq!(count_kind(&matrix, ReservedKind::DarkModule), 1);
        assert_eq!(count_kind(&matrix, ReservedKind::VersionInfo), 0);

        // Dark module sits at column 8, row size - 8.
        let dark = matrix.reserved()[13 * 21 + 8].expect("dark module reserved");
        assert_eq!(dark, ReservedBit { kind: ReservedKind::DarkModule, dark: true });

        // Timing row alternates starting dark at column 8.
        let row: Vec<bool> = (8..13).map(|x| matrix.modules()[6 * 21 + x]).collect();
        assert_eq!(row, vec![true, false, true, false, true]);

        // Finder centre dark, inner ring light.
        assert!(matrix.modules()[3 * 21 + 3]);
        assert!(!matrix.modules()[1 * 21 + 1]);
        assert!(matrix.modules()[0]);
    }

    #[test]
    fn test_version_info_placement() {
        let matrix = ModuleMatrix::new(Version::new(7));
        assert_eq!(count_kind(&matrix, ReservedKind::VersionInfo), 36);
        let size = matrix.size();
        let bits = version_info_bits(7);
        for i in 0..18 {
            let a = size - 11 + i % 3;
            let b = i / 3;
            assert_eq!(matrix.modules()[b * size + a], get_bit(bits, i));
            assert_eq!(matrix.modules()[a * size + b], get_bit(bits, i));
        }
    }

    #[test]
    fn test_every_module_is_reserved_or_filled() {
        for ver in 1..=40u8 {
            let matrix = ModuleMatrix::new(Version::new(ver));
            let unreserved = matrix.reserved().iter().filter(|r| r.is_none()).count();
            let codewords = CODEWORDS[usize::from(ver) - 1];
            assert_eq!(unreserved, num_raw_data_modules(usize::from(ver)), "version {ver}");
            assert_eq!(unreserved / 8, codewords, "version {ver}");
            assert!([0, 3, 4, 7].contains(&(unreserved % 8)), "version {ver}");
        }
    }

    #[test]
    fn test_place_codewords_fills_every_data_module() {
        for ver in [1u8, 2, 7, 14, 40] {
            let version = Version::new(ver);
            let mut matrix = ModuleMatrix::new(version);
            let codewords = vec![0xffu8; CODEWORDS[usize::from(ver) - 1]];
            matrix.place_codewords(&codewords);
            let dark_data = matrix
                .modules()
                .iter()
                .zip(matrix.reserved())
                .filter(|(&m, r)| m && r.is_none())
                .count();
            assert_eq!(dark_data, codewords.len() * 8, "version {ver}");
        }
    }

    #[test]
    fn test_place_codewords_starts_bottom_right() {
        let mut matrix = ModuleMatrix::new(Version::new(1));
        let mut codewords = vec![0u8; 26];
        codewords[0] = 0b1010_0000;
        matrix.place_codewords(&codewords);
        let m = matrix.modules();
        // First bit at (20, 20), second at (19, 20), third at (20, 19).
        assert!(m[20 * 21 + 20]);
        assert!(!m[20 * 21 + 19]);
        assert!(m[19 * 21 + 20]);
    }

    #[test]
    fn test_apply_mask_twice_restores() {
        let mut matrix = ModuleMatrix::new(Version::new(3));
        matrix.place_codewords(&vec![0x5a; CODEWORDS[2]]);
        let before = matrix.modules().to_vec();
        for m in 0..8 {
            matrix.apply_mask(Mask::new(m));
            matrix.apply_mask(Mask::new(m));
        }
        assert_eq!(matrix.modules(), &before[..]);
    }

    #[test]
    fn test_draw_format_bits_marks_dark() {
        let mut matrix = ModuleMatrix::new(Version::new(1));
        matrix.draw_format_bits(QrCodeEcc::Low, Mask::new(0));
        let bits = format_info_bits(QrCodeEcc::Low, Mask::new(0));
        // Bit 0 lives at (8, 0) and at (20, 8).
        assert_eq!(matrix.modules()[8], get_bit(bits, 0));
        assert_eq!(matrix.modules()[8 * 21 + 20], get_bit(bits, 0));
        assert_eq!(matrix.reserved()[8].map(|r| r.dark), Some(get_bit(bits, 0)));
    }
}
