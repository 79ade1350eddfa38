//! Input segmentation and segment-mode optimisation.
//!
//! Text is first split into maximal runs of one character class
//! ([`basic_segments`]), then adjacent runs are merged or widened to a more
//! general mode when that lowers the total encoded size
//! ([`optimize_segments`]). The merge is a shortest-path search over a small
//! layered graph where each run contributes one node per mode it can be
//! encoded in.

use core::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::qrcode::{BitBuffer, QrError, Version};
use crate::tables::MODE_INDICATOR_BITS;

static ALPHANUMERIC_CHARSET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

/// Encoding mode of a segment.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Mode {
    Numeric,
    Alphanumeric,
    Byte,
    /// Declared by the standard but never produced or accepted by this encoder.
    Kanji,
}

impl Mode {
    /// The 4-bit mode indicator.
    pub fn mode_bits(self) -> u32 {
        use Mode::*;
        match self {
            Numeric => 0x1,
            Alphanumeric => 0x2,
            Byte => 0x4,
            Kanji => 0x8,
        }
    }

    /// Width of the character count indicator for the given version.
    pub fn num_char_count_bits(self, ver: Version) -> u8 {
        self.char_count_bits_for_regime(ver.regime())
    }

    /// Width of the character count indicator for a version regime
    /// (0 = versions 1-9, 1 = 10-26, 2 = 27-40).
    pub fn char_count_bits_for_regime(self, regime: usize) -> u8 {
        use Mode::*;
        (match self {
            Numeric => [10, 12, 14],
            Alphanumeric => [9, 11, 13],
            Byte => [8, 16, 16],
            Kanji => [8, 10, 12],
        })[regime]
    }

    /// This mode followed by every mode able to represent the same characters.
    fn candidates(self) -> &'static [Mode] {
        use Mode::*;
        match self {
            Numeric => &[Numeric, Alphanumeric, Byte],
            Alphanumeric => &[Alphanumeric, Byte],
            Byte => &[Byte],
            Kanji => &[Kanji],
        }
    }

    /// Payload size in bits for `numchars` characters (bytes in byte mode).
    pub fn payload_bits(self, numchars: usize) -> usize {
        use Mode::*;
        match self {
            Numeric => numchars / 3 * 10 + [0, 4, 7][numchars % 3],
            Alphanumeric => numchars / 2 * 11 + numchars % 2 * 6,
            Byte => numchars * 8,
            Kanji => numchars * 13,
        }
    }

    fn of_char(c: char) -> Self {
        if c.is_ascii_digit() {
            Mode::Numeric
        } else if ALPHANUMERIC_CHARSET.contains(c) {
            Mode::Alphanumeric
        } else {
            Mode::Byte
        }
    }
}

/// A run of input text tagged with the mode it is encoded in.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct QrSegment {
    mode: Mode,
    value: String,
}

impl QrSegment {
    pub fn new(mode: Mode, value: impl Into<String>) -> Self {
        Self {
            mode,
            value: value.into(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Value of the character count indicator: characters, or UTF-8 bytes
    /// in byte mode.
    pub fn num_chars(&self) -> usize {
        match self.mode {
            Mode::Kanji => self.value.chars().count(),
            _ => self.value.len(),
        }
    }

    /// Size of the encoded payload, without mode or count indicators.
    pub fn bit_length(&self) -> usize {
        self.mode.payload_bits(self.num_chars())
    }

    /// Size of the segment including its mode and count indicators.
    pub fn total_bits(&self, regime: usize) -> usize {
        MODE_INDICATOR_BITS
            + usize::from(self.mode.char_count_bits_for_regime(regime))
            + self.bit_length()
    }

    pub fn is_numeric(text: &str) -> bool {
        text.chars().all(|c| c.is_ascii_digit())
    }

    pub fn is_alphanumeric(text: &str) -> bool {
        text.chars().all(|c| ALPHANUMERIC_CHARSET.contains(c))
    }

    /// Checks that the value is non-empty and encodable in the segment's mode.
    pub(crate) fn validate(&self) -> Result<(), QrError> {
        if self.value.is_empty() {
            return Err(QrError::InvalidInput("segment value is empty"));
        }
        match self.mode {
            Mode::Numeric if !Self::is_numeric(&self.value) => {
                Err(QrError::InvalidInput("numeric segment contains non-digit characters"))
            }
            Mode::Alphanumeric if !Self::is_alphanumeric(&self.value) => Err(
                QrError::InvalidInput("alphanumeric segment contains unencodable characters"),
            ),
            Mode::Kanji => Err(QrError::UnsupportedMode(Mode::Kanji)),
            _ => Ok(()),
        }
    }

    /// Appends the mode-specific payload bits.
    pub(crate) fn append_payload(&self, bb: &mut BitBuffer) {
        match self.mode {
            Mode::Numeric => {
                for chunk in self.value.as_bytes().chunks(3) {
                    let num = chunk
                        .iter()
                        .fold(0u32, |acc, &b| acc * 10 + u32::from(b - b'0'));
                    bb.append_bits(num, [0, 4, 7, 10][chunk.len()]);
                }
            }
            Mode::Alphanumeric => {
                let mut pairs = self.value.chars().map(alphanumeric_index);
                while let Some(first) = pairs.next() {
                    match pairs.next() {
                        Some(second) => bb.append_bits(first * 45 + second, 11),
                        None => bb.append_bits(first, 6),
                    }
                }
            }
            Mode::Byte => {
                for &b in self.value.as_bytes() {
                    bb.append_bits(u32::from(b), 8);
                }
            }
            Mode::Kanji => unreachable!("Kanji segments are rejected before encoding"),
        }
    }
}

fn alphanumeric_index(c: char) -> u32 {
    ALPHANUMERIC_CHARSET.find(c).map_or(0, |i| i as u32)
}

/// Splits text into maximal runs of numeric, alphanumeric and byte characters.
///
/// Digits always form numeric runs, so an alphanumeric run only holds
/// uppercase letters and the symbols ` $%*+-./:`.
///
/// ```
/// use qrgrid::segment::{basic_segments, Mode, QrSegment};
///
/// let segs = basic_segments("Hello");
/// assert_eq!(segs, vec![
///     QrSegment::new(Mode::Alphanumeric, "H"),
///     QrSegment::new(Mode::Byte, "ello"),
/// ]);
/// ```
pub fn basic_segments(text: &str) -> Vec<QrSegment> {
    let mut result: Vec<QrSegment> = Vec::new();
    for c in text.chars() {
        let mode = Mode::of_char(c);
        match result.last_mut() {
            Some(last) if last.mode == mode => last.value.push(c),
            _ => result.push(QrSegment::new(mode, c)),
        }
    }
    result
}

const START_NODE: usize = 0;

/// Merges basic segments into the cheapest sequence of encoded segments for
/// the given character count regime.
///
/// Every basic segment becomes one node per candidate mode. An edge between
/// two nodes of the same mode costs the extra payload bits of extending the
/// run; any other edge costs the full segment including its mode and count
/// indicators. Adjacent path nodes with the same mode are concatenated.
pub fn optimize_segments(segments: &[QrSegment], regime: usize) -> Vec<QrSegment> {
    // Index 0 is the start node, the last entry is the end node.
    let mut nodes: Vec<Option<QrSegment>> = vec![None];
    let mut edges: Vec<Vec<(usize, usize)>> = vec![Vec::new()];
    let mut previous: Vec<usize> = vec![START_NODE];

    for seg in segments {
        let mut current = Vec::with_capacity(3);
        for &mode in seg.mode.candidates() {
            let candidate = QrSegment::new(mode, seg.value.as_str());
            let id = nodes.len();
            for &prev in &previous {
                let weight = match &nodes[prev] {
                    Some(p) if p.mode == mode => {
                        mode.payload_bits(p.num_chars() + candidate.num_chars()) - p.bit_length()
                    }
                    _ => candidate.total_bits(regime),
                };
                edges[prev].push((id, weight));
            }
            nodes.push(Some(candidate));
            edges.push(Vec::new());
            current.push(id);
        }
        previous = current;
    }
    let end = nodes.len();
    nodes.push(None);
    edges.push(Vec::new());
    for &prev in &previous {
        edges[prev].push((end, 0));
    }

    let mut result: Vec<QrSegment> = Vec::new();
    for id in shortest_path(&edges, START_NODE, end) {
        let Some(seg) = nodes[id].take() else {
            continue;
        };
        match result.last_mut() {
            Some(last) if last.mode == seg.mode => last.value.push_str(&seg.value),
            _ => result.push(seg),
        }
    }
    result
}

/// Dijkstra over integer node ids. Returns the node sequence from `start` to
/// `target`, or an empty vector when `target` is unreachable.
fn shortest_path(edges: &[Vec<(usize, usize)>], start: usize, target: usize) -> Vec<usize> {
    let mut distances = vec![usize::MAX; edges.len()];
    let mut previous: Vec<Option<usize>> = vec![None; edges.len()];
    let mut visited = vec![false; edges.len()];
    let mut queue = BinaryHeap::new();

    distances[start] = 0;
    queue.push(Reverse((0usize, start)));
    while let Some(Reverse((dist, node))) = queue.pop() {
        if visited[node] {
            continue;
        }
        visited[node] = true;
        for &(next, weight) in &edges[node] {
            let candidate = dist + weight;
            if candidate < distances[next] {
                distances[next] = candidate;
                previous[next] = Some(node);
                queue.push(Reverse((candidate, next)));
            }
        }
    }

    if distances[target] == usize::MAX {
        return Vec::new();
    }
    let mut path = vec![target];
    let mut node = target;
    while let Some(prev) = previous[node] {
        path.push(prev);
        node = prev;
    }
    path.reverse();
    path
}
