//! # qrgrid
//!
//! A Rust library for encoding text into QR Code symbols.
//!
//! `qrgrid` turns a string into a square grid of dark and light modules following the QR Code
//! Model 2 standard. It supports versions 1 to 40 and four error correction levels, picks the
//! smallest version that fits, splits the input into the cheapest mix of numeric, alphanumeric and
//! byte segments, and chooses the mask with the lowest penalty score.
//!
//! ## Features
//!
//! - Optimal segmentation of mixed input (numeric, alphanumeric and byte runs).
//! - Reed-Solomon error correction with block interleaving.
//! - A per-module reserved-bit map telling function patterns apart from data.
//! - Render QR codes as text, SVG, in-memory image buffers or PNG files.
//! - Optional parallel mask evaluation behind the `parallel` feature.
//! - Safe Rust implementation with no unsafe code.
//!
//! ## Installation
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! qrgrid = "0.1" # Replace with the latest version
//! ```
//!
//! ## Example
//!
//! ```rust
//! use qrgrid::{encode, QrCodeEcc, QrOptions};
//!
//! let options = QrOptions::new().with_error_correction(QrCodeEcc::High);
//! let qr = encode("https://example.com", options).unwrap();
//!
//! assert_eq!(qr.size(), qr.version().size());
//! assert_eq!(qr.data().len(), qr.size() * qr.size());
//! ```
//!
//! Render it as SVG:
//!
//! ```rust
//! use qrgrid::{encode, helper::to_svg_string, QrOptions};
//!
//! let qr = encode("Hello, World!", QrOptions::default()).unwrap();
//! let svg = to_svg_string(&qr, 4);
//! assert!(svg.contains("<svg"));
//! ```
//!
//! ## Modules
//!
//! - [`qrcode`]: The QR code symbol and the encoding pipeline.
//! - [`segment`]: Input segmentation and mode optimisation.
//! - [`reed_solomon`]: GF(256) arithmetic and error correction codewords.
//! - [`mask`]: Mask patterns and penalty scoring.
//! - [`helper`]: Utilities for rendering QR codes in various formats.

pub mod helper;
pub mod mask;
mod matrix;
pub mod qrcode;
pub mod reed_solomon;
pub mod segment;
mod tables;

pub use crate::mask::Mask;
pub use crate::matrix::{ReservedBit, ReservedKind};
pub use crate::qrcode::{QrCode, QrCodeEcc, QrError, QrOptions, Version};
pub use crate::segment::{Mode, QrSegment};

/// Encodes `input` into a QR code.
///
/// Shorthand for [`QrCode::encode_text`].
///
/// # Errors
///
/// Returns [`QrError::InvalidInput`] for empty input and
/// [`QrError::CapacityExceeded`] when the data does not fit version 40.
pub fn encode(input: &str, options: QrOptions) -> Result<QrCode, QrError> {
    QrCode::encode_text(input, options)
}
