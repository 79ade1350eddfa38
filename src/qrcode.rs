#![forbid(unsafe_code)]
//! QR code encoding functionality.
//!
//! This module holds the [`QrCode`] symbol and the pipeline that builds it:
//! segment optimisation and version selection, codeword generation with
//! Reed-Solomon error correction, module placement and mask selection.

use core::str::FromStr;

use tracing::{debug, debug_span};

use crate::mask::{self, Mask};
use crate::matrix::{ModuleMatrix, ReservedBit, ReservedKind};
use crate::reed_solomon::rs_encode;
use crate::segment::{basic_segments, optimize_segments, Mode, QrSegment};
use crate::tables::{
    CHARACTER_COUNT_MAX_VERSION, CODEWORDS, ECC_CODEWORDS_PER_BLOCK, MODE_INDICATOR_BITS,
    NUM_ERROR_CORRECTION_BLOCKS, PAD_CODEWORDS,
};

/// A QR Code symbol, representing a square grid of dark and light modules.
///
/// The grid is stored row-major in [`data`](Self::data); every module that
/// belongs to a function pattern also has an entry in
/// [`reserved_bits`](Self::reserved_bits). Instances are immutable after
/// creation.
///
/// # Example
///
/// ```rust
/// use qrgrid::{QrCode, QrCodeEcc, QrOptions};
///
/// let options = QrOptions::new().with_error_correction(QrCodeEcc::Quartile);
/// let qr = QrCode::encode_text("HELLO WORLD", options).unwrap();
///
/// assert_eq!(qr.version().value(), 1);
/// assert_eq!(qr.size(), 21);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QrCode {
    /// The width and height of this QR Code, measured in modules, between
    /// 21 and 177 (inclusive). This is equal to version * 4 + 17.
    size: usize,

    version: Version,

    error_correction: QrCodeEcc,

    mask: Mask,

    /// Final module colours (true = dark), row-major.
    modules: Vec<bool>,

    /// Role of each function-pattern module; `None` for data modules.
    reserved: Vec<Option<ReservedBit>>,

    /// The segments actually encoded, after optimisation.
    segments: Vec<QrSegment>,
}

impl QrCode {
    /// Encodes a text string into a QR code.
    ///
    /// The smallest version able to hold the text at the requested error
    /// correction level is chosen automatically, and the text is split into
    /// numeric, alphanumeric and byte segments in the cheapest arrangement.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::InvalidInput`] for an empty string and
    /// [`QrError::CapacityExceeded`] when no version 1-40 can hold the data.
    pub fn encode_text(text: &str, options: QrOptions) -> Result<Self, QrError> {
        if text.is_empty() {
            return Err(QrError::InvalidInput("input text is empty"));
        }
        Self::encode_segments(basic_segments(text), options)
    }

    /// Encodes caller-built segments.
    ///
    /// The segments are treated as basic runs: adjacent runs may still be
    /// merged or widened to a more general mode if that saves space.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::InvalidInput`] for an empty list or a segment whose
    /// value does not fit its mode, [`QrError::UnsupportedMode`] for Kanji
    /// segments and [`QrError::CapacityExceeded`] when the data is too long.
    pub fn encode_segments(segs: Vec<QrSegment>, options: QrOptions) -> Result<Self, QrError> {
        if segs.is_empty() {
            return Err(QrError::InvalidInput("no segments to encode"));
        }
        for seg in &segs {
            seg.validate()?;
        }
        let ecl = options.error_correction;
        let _span = debug_span!("encode", segments = segs.len(), ecl = ?ecl).entered();

        let (version, segments) = select_version(&segs, ecl)?;
        debug!(
            version = version.value(),
            segments = segments.len(),
            "selected version"
        );

        let datacodewords = Self::encode_segments_to_codewords(&segments, version, ecl);
        let allcodewords = Self::add_ecc_and_interleave(&datacodewords, version, ecl);
        debug!(
            data = datacodewords.len(),
            total = allcodewords.len(),
            "generated codewords"
        );

        let (matrix, mask) = Self::encode_codewords(&allcodewords, version, ecl, options.mask);
        debug!(mask = mask.value(), "applied mask");

        let size = matrix.size();
        let (modules, reserved) = matrix.into_parts();
        Ok(Self {
            size,
            version,
            error_correction: ecl,
            mask,
            modules,
            reserved,
            segments,
        })
    }

    /// Serialises segments into the padded data codeword sequence for
    /// `version` and `ecl`.
    fn encode_segments_to_codewords(segs: &[QrSegment], version: Version, ecl: QrCodeEcc) -> Vec<u8> {
        let datacapacitybits: usize = get_num_data_codewords(version, ecl) * 8;
        let mut bb = BitBuffer::new();
        for seg in segs {
            let ccbits: u8 = seg.mode().num_char_count_bits(version);
            debug_assert!(seg.num_chars() < 1 << ccbits, "character count overflows indicator");
            bb.append_bits(seg.mode().mode_bits(), MODE_INDICATOR_BITS as u8);
            bb.append_bits(seg.num_chars() as u32, ccbits);
            seg.append_payload(&mut bb);
        }
        debug_assert!(bb.len() <= datacapacitybits);

        // Add terminator and pad up to a byte if applicable
        let numzerobits: usize = core::cmp::min(4, datacapacitybits - bb.len());
        bb.append_bits(0, numzerobits as u8);
        let numzerobits: usize = bb.len().wrapping_neg() & 7;
        bb.append_bits(0, numzerobits as u8);
        debug_assert_eq!(bb.len() % 8, 0);

        // Pad with alternating bytes until data capacity is reached
        for &padbyte in PAD_CODEWORDS.iter().cycle() {
            if bb.len() >= datacapacitybits {
                break;
            }
            bb.append_bits(u32::from(padbyte), 8);
        }
        bb.into_bytes()
    }

    /// Splits the data codewords into blocks, appends each block's error
    /// correction codewords and interleaves everything column by column.
    fn add_ecc_and_interleave(data: &[u8], ver: Version, ecl: QrCodeEcc) -> Vec<u8> {
        assert_eq!(data.len(), get_num_data_codewords(ver, ecl));
        let totalcodewords: usize = get_num_codewords(ver);
        let numblocks: usize = table_get(&NUM_ERROR_CORRECTION_BLOCKS, ver, ecl);
        let blockecclen: usize = table_get(&ECC_CODEWORDS_PER_BLOCK, ver, ecl);

        // Blocks in the second group hold one more data codeword.
        let numlongblocks: usize = totalcodewords % numblocks;
        let numshortblocks: usize = numblocks - numlongblocks;
        let shortblockdatalen: usize = data.len() / numblocks;
        debug_assert_eq!(totalcodewords / numblocks - shortblockdatalen, blockecclen);

        let mut blockoffsets: Vec<usize> = Vec::with_capacity(numblocks + 1);
        let mut eccdata: Vec<u8> = Vec::with_capacity(numblocks * blockecclen);
        let mut offset: usize = 0;
        blockoffsets.push(offset);
        for i in 0..numblocks {
            let datlen: usize = shortblockdatalen + usize::from(i >= numshortblocks);
            eccdata.extend(rs_encode(&data[offset..offset + datlen], blockecclen));
            offset += datlen;
            blockoffsets.push(offset);
        }
        debug_assert_eq!(offset, data.len());

        let maxdatalen: usize = shortblockdatalen + usize::from(numlongblocks > 0);
        let mut result: Vec<u8> = Vec::with_capacity(totalcodewords);
        for i in 0..maxdatalen {
            for j in 0..numblocks {
                let index = blockoffsets[j] + i;
                if index < blockoffsets[j + 1] {
                    result.push(data[index]);
                }
            }
        }
        for i in 0..blockecclen {
            for j in 0..numblocks {
                result.push(eccdata[j * blockecclen + i]);
            }
        }
        debug_assert_eq!(result.len(), totalcodewords);
        result
    }

    /// Lays out the function patterns, places the codewords and applies
    /// either the given mask or the one with the lowest penalty.
    fn encode_codewords(
        allcodewords: &[u8],
        version: Version,
        ecl: QrCodeEcc,
        msk: Option<Mask>,
    ) -> (ModuleMatrix, Mask) {
        let mut matrix = ModuleMatrix::new(version);
        matrix.place_codewords(allcodewords);
        let msk: Mask = msk.unwrap_or_else(|| mask::select_mask(&matrix, ecl));
        matrix.apply_mask(msk);
        matrix.draw_format_bits(ecl, msk);
        (matrix, msk)
    }

    /// Returns this QR Code's version, in the range [1, 40].
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns this QR Code's size, in the range [21, 177].
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns this QR Code's error correction level.
    pub fn error_correction(&self) -> QrCodeEcc {
        self.error_correction
    }

    /// Returns this QR Code's mask, in the range [0, 7].
    pub fn mask(&self) -> Mask {
        self.mask
    }

    /// The module grid, row-major, `size * size` entries (true = dark).
    pub fn data(&self) -> &[bool] {
        &self.modules
    }

    /// Reserved-bit tags, one per module, row-major.
    pub fn reserved_bits(&self) -> &[Option<ReservedBit>] {
        &self.reserved
    }

    /// The optimised segments that were encoded.
    pub fn segments(&self) -> &[QrSegment] {
        &self.segments
    }

    /// Returns the color of the module at the given coordinates.
    ///
    /// Returns `true` for dark modules and `false` for light modules. Coordinates outside the QR
    /// code's bounds return `false`.
    ///
    /// # Arguments
    ///
    /// * `x` - X-coordinate (0 is left).
    /// * `y` - Y-coordinate (0 is top).
    pub fn get_module(&self, x: i32, y: i32) -> bool {
        self.index(x, y).map_or(false, |i| self.modules[i])
    }

    /// The reserved-bit tag at the given coordinates, if any.
    pub fn reserved_bit(&self, x: i32, y: i32) -> Option<ReservedBit> {
        self.index(x, y).and_then(|i| self.reserved[i])
    }

    /// Whether the module belongs to one of the three finder patterns.
    pub fn is_finder_module(&self, x: i32, y: i32) -> bool {
        self.reserved_bit(x, y)
            .map_or(false, |r| r.kind == ReservedKind::FinderPattern)
    }

    /// Penalty of the final grid under the four masking rules.
    pub fn penalty_score(&self) -> u32 {
        mask::penalty_score(&self.modules, self.size)
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        (x < self.size && y < self.size).then(|| y * self.size + x)
    }
}

/// Finds the smallest version that holds the segments, trying the three
/// character count regimes in order. The segments are re-optimised per
/// regime since the indicator widths change the cost of every segment.
fn select_version(basic: &[QrSegment], ecl: QrCodeEcc) -> Result<(Version, Vec<QrSegment>), QrError> {
    let mut required_bits: usize = 0;
    let mut capacity_bits: usize = 0;
    for (regime, &maxversion) in CHARACTER_COUNT_MAX_VERSION.iter().enumerate() {
        let segments = optimize_segments(basic, regime);
        // A single segment is measured in characters, several in bits.
        let mode: Option<Mode> = match segments.as_slice() {
            [single] => Some(single.mode()),
            _ => None,
        };
        let used: usize = match mode {
            Some(_) => segments[0].num_chars(),
            None => segments.iter().map(|s| s.total_bits(regime)).sum(),
        };
        let minversion: u8 = match regime {
            0 => Version::MIN.value(),
            _ => CHARACTER_COUNT_MAX_VERSION[regime - 1] + 1,
        };

        if used <= get_capacity(Version::new(maxversion), ecl, mode) {
            for ver in minversion..=maxversion {
                let version = Version::new(ver);
                if used <= get_capacity(version, ecl, mode) {
                    return Ok((version, segments));
                }
            }
        }
        debug!(regime, used, "data does not fit regime");
        required_bits = segments.iter().map(|s| s.total_bits(regime)).sum();
        capacity_bits = get_num_data_codewords(Version::new(maxversion), ecl) * 8;
    }
    Err(QrError::CapacityExceeded {
        required_bits,
        capacity_bits,
    })
}

/// Capacity of `version` at `ecl`: characters for a single-mode message,
/// data bits for a mixed one (`mode == None`).
fn get_capacity(version: Version, ecl: QrCodeEcc, mode: Option<Mode>) -> usize {
    let databits: usize = get_num_data_codewords(version, ecl) * 8;
    let Some(mode) = mode else {
        return databits;
    };
    let overhead = usize::from(mode.num_char_count_bits(version)) + MODE_INDICATOR_BITS;
    let usable = databits.saturating_sub(overhead);
    match mode {
        Mode::Numeric => usable * 3 / 10,
        Mode::Alphanumeric => usable * 2 / 11,
        Mode::Byte => usable / 8,
        Mode::Kanji => usable / 13,
    }
}

fn get_num_codewords(ver: Version) -> usize {
    CODEWORDS[usize::from(ver.value()) - 1]
}

fn get_num_data_codewords(ver: Version, ecl: QrCodeEcc) -> usize {
    get_num_codewords(ver)
        - table_get(&ECC_CODEWORDS_PER_BLOCK, ver, ecl) * table_get(&NUM_ERROR_CORRECTION_BLOCKS, ver, ecl)
}

fn table_get(table: &'static [[i8; 41]; 4], ver: Version, ecl: QrCodeEcc) -> usize {
    table[ecl.ordinal()][usize::from(ver.value())] as usize
}

/// Options accepted by [`QrCode::encode_text`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QrOptions {
    /// Error correction level, `Medium` by default.
    pub error_correction: QrCodeEcc,
    /// Forces a mask pattern instead of picking the lowest-penalty one.
    pub mask: Option<Mask>,
}

impl QrOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_error_correction(mut self, ecl: QrCodeEcc) -> Self {
        self.error_correction = ecl;
        self
    }

    pub fn with_mask(mut self, mask: Mask) -> Self {
        self.mask = Some(mask);
        self
    }
}

/// Error correction level for a QR code.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub enum QrCodeEcc {
    /// Tolerates ~7% erroneous codewords.
    Low,
    /// Tolerates ~15% erroneous codewords.
    #[default]
    Medium,
    /// Tolerates ~25% erroneous codewords.
    Quartile,
    /// Tolerates ~30% erroneous codewords.
    High,
}

impl QrCodeEcc {
    /// Returns an unsigned 2-bit integer (in the range 0 to 3).
    fn ordinal(self) -> usize {
        use QrCodeEcc::*;
        match self {
            Low => 0,
            Medium => 1,
            Quartile => 2,
            High => 3,
        }
    }

    /// Returns the 2-bit level indicator used in the format information.
    pub(crate) fn format_bits(self) -> u8 {
        use QrCodeEcc::*;
        match self {
            Low => 1,
            Medium => 0,
            Quartile => 3,
            High => 2,
        }
    }
}

impl FromStr for QrCodeEcc {
    type Err = QrError;

    /// Parses the single-letter level names `L`, `M`, `Q` and `H`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "L" | "l" => Ok(Self::Low),
            "M" | "m" => Ok(Self::Medium),
            "Q" | "q" => Ok(Self::Quartile),
            "H" | "h" => Ok(Self::High),
            _ => Err(QrError::InvalidInput("unknown error correction level")),
        }
    }
}

/// Errors returned while encoding.
///
/// Ways to handle [`QrError::CapacityExceeded`]:
///
/// - Decrease the error correction level if it was greater than `QrCodeEcc::Low`.
/// - Change the text to fit the character set of a more compact mode (e.g. uppercase
///   alphanumeric).
/// - Change the text to be shorter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QrError {
    /// Empty input, or a segment that cannot be encoded in its mode.
    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),
    /// No version 1-40 holds the data at the requested level.
    #[error("Data length = {required_bits} bits, Max capacity = {capacity_bits} bits")]
    CapacityExceeded {
        required_bits: usize,
        capacity_bits: usize,
    },
    /// The segment mode is not implemented by this encoder.
    #[error("Unsupported segment mode: {0:?}")]
    UnsupportedMode(Mode),
}

/// A QR code version (1–40).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Version(u8);

impl Version {
    /// The minimum version number supported in the QR Code Model 2 standard.
    pub const MIN: Version = Version(1);

    /// The maximum version number supported in the QR Code Model 2 standard.
    pub const MAX: Version = Version(40);

    /// Creates a version object from the given number.
    ///
    /// # Panics
    ///
    /// Panics if the number is outside the range [1, 40].
    pub const fn new(ver: u8) -> Self {
        assert!(
            Version::MIN.value() <= ver && ver <= Version::MAX.value(),
            "Version number out of range"
        );
        Self(ver)
    }

    /// Returns the value, which is in the range [1, 40].
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Side length in modules.
    pub const fn size(self) -> usize {
        self.0 as usize * 4 + 17
    }

    /// Character count indicator regime: 0 for versions 1-9, 1 for 10-26,
    /// 2 for 27-40.
    pub const fn regime(self) -> usize {
        (self.0 as usize + 7) / 17
    }
}

/// An append-only sequence of bits, packed most significant bit first.
#[derive(Clone, Debug, Default)]
pub(crate) struct BitBuffer {
    data: Vec<u8>,
    length: usize,
}

impl BitBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn append_bits(&mut self, val: u32, len: u8) {
        assert!(len <= 31 && (val >> len) == 0);
        for i in (0..len).rev() {
            if self.length % 8 == 0 {
                self.data.push(0);
            }
            let bit: u8 = ((val >> i) as u8) & 1;
            self.data[self.length >> 3] |= bit << (7 - (self.length & 7));
            self.length += 1;
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}
