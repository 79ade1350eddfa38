use crate::qrcode::{QrCode, QrError, QrOptions};

use image::{GrayImage, ImageBuffer, Luma};
use std::fs;
use std::path::Path;

/*---- Utilities ----*/

// Returns a string of SVG code for an image depicting
// the given QR Code, with the given number of border modules.
// Finder patterns and the remaining dark modules are emitted as two
// separate paths so they can be styled independently.
// The string always uses Unix newlines (\n), regardless of the platform.
pub fn to_svg_string(qr: &QrCode, border: i32) -> String {
    assert!(border >= 0, "Border must be non-negative");
    let size = qr.size() as i32;
    let dimension = size + border * 2;
    let mut finders = String::new();
    let mut codewords = String::new();
    for y in 0..size {
        for x in 0..size {
            if !qr.get_module(x, y) {
                continue;
            }
            let path = if qr.is_finder_module(x, y) {
                &mut finders
            } else {
                &mut codewords
            };
            if !path.is_empty() {
                path.push(' ');
            }
            path.push_str(&format!("M{},{}h1v1h-1z", x + border, y + border));
        }
    }

    let mut result = String::new();
    result += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
    result += "<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n";
    result += &format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" viewBox=\"0 0 {0} {0}\" stroke=\"none\">\n",
        dimension
    );
    result += "\t<rect width=\"100%\" height=\"100%\" fill=\"#FFFFFF\"/>\n";
    result += &format!("\t<path class=\"finder\" d=\"{}\" fill=\"#000000\"/>\n", finders);
    result += &format!("\t<path class=\"data\" d=\"{}\" fill=\"#000000\"/>\n", codewords);
    result += "</svg>\n";
    result
}

/// Renders the QR Code as text, two characters per module, with `border`
/// light modules on every side.
pub fn to_console_string(qr: &QrCode, border: i32) -> String {
    assert!(border >= 0, "Border must be non-negative");
    let size = qr.size() as i32;
    let mut result = String::new();
    for y in -border..size + border {
        for x in -border..size + border {
            let c: char = if qr.get_module(x, y) { '█' } else { ' ' };
            result.push(c);
            result.push(c);
        }
        result.push('\n');
    }
    result
}

/// Prints the given QrCode object to the console.
pub fn print_qr(qr: &QrCode) {
    println!("{}", to_console_string(qr, 4));
}

/// Rasterises the QR Code into a greyscale image.
///
/// # Arguments
///
/// * `qr` - The QR Code object to convert.
/// * `scale` - Pixels per module, at least 1.
/// * `border` - Width of the light quiet zone, in modules.
///
/// # Example
///
/// ```rust
/// use qrgrid::{helper::to_image_buffer, QrCode, QrOptions};
///
/// let qr = QrCode::encode_text("Hello, World!", QrOptions::default()).unwrap();
/// let img = to_image_buffer(&qr, 2, 4);
/// assert_eq!(img.width(), (qr.size() as u32 + 8) * 2);
/// ```
pub fn to_image_buffer(qr: &QrCode, scale: u32, border: u32) -> GrayImage {
    assert!(scale >= 1, "Scale must be positive");
    let size = (qr.size() as u32 + 2 * border) * scale;
    ImageBuffer::from_fn(size, size, |x, y| {
        let qr_x = (x / scale) as i32 - border as i32;
        let qr_y = (y / scale) as i32 - border as i32;
        if qr.get_module(qr_x, qr_y) {
            Luma([0u8]) // Black
        } else {
            Luma([255u8]) // White
        }
    })
}

/// Renders the QR Code and writes it as a PNG file, creating the parent
/// directory if needed.
///
/// # Errors
///
/// Returns an `image::ImageError` if the directory cannot be created or the
/// image cannot be saved.
pub fn save_png(qr: &QrCode, path: impl AsRef<Path>, scale: u32, border: u32) -> image::ImageResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    to_image_buffer(qr, scale, border).save_with_format(path, image::ImageFormat::Png)
}

/// Generates a QR Code SVG from the provided content.
///
/// # Example
///
/// ```
/// use qrgrid::helper::generate_svg_string;
///
/// let svg_string = generate_svg_string("Hello, World!").unwrap();
/// assert!(svg_string.ends_with("</svg>\n"));
/// ```
pub fn generate_svg_string(content: &str) -> Result<String, QrError> {
    let qr = QrCode::encode_text(content, QrOptions::default())?;
    Ok(to_svg_string(&qr, 4))
}

/// Generates a QR Code image buffer from the provided content, one pixel per
/// module with a four module border.
pub fn generate_image_buffer(content: &str) -> Result<GrayImage, QrError> {
    let qr = QrCode::encode_text(content, QrOptions::default())?;
    Ok(to_image_buffer(&qr, 1, 4))
}

// Tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::qrcode::QrCodeEcc;

    fn hello_world() -> QrCode {
        let options = QrOptions::new().with_error_correction(QrCodeEcc::Quartile);
        QrCode::encode_text("HELLO WORLD", options).unwrap()
    }

    #[test]
    fn test_to_svg_string() {
        let qr = hello_world();
        let svg = to_svg_string(&qr, 4);

        assert!(svg.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(svg.contains("viewBox=\"0 0 29 29\""));
        // Finder at the top-left corner, shifted by the border.
        assert!(svg.contains("<path class=\"finder\" d=\"M4,4h1v1h-1z"));
        let dark = qr.data().iter().filter(|&&m| m).count();
        assert_eq!(svg.matches("h1v1h-1z").count(), dark);
    }

    #[test]
    fn test_to_console_string() {
        let qr = hello_world();
        let text = to_console_string(&qr, 1);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 23);
        assert!(lines.iter().all(|l| l.chars().count() == 46));
        assert!(lines[0].chars().all(|c| c == ' '));
        assert!(lines[1].starts_with("  ██████████████"));
    }

    #[test]
    fn test_to_image_buffer() {
        let qr = hello_world();
        let img = to_image_buffer(&qr, 3, 4);
        assert_eq!(img.dimensions(), (87, 87));
        assert_eq!(img.get_pixel(0, 0), &Luma([255u8]));
        assert_eq!(img.get_pixel(12, 12), &Luma([0u8]));
        assert_eq!(img.get_pixel(14, 14), &Luma([0u8]));
    }

    #[test]
    fn test_generate_image_buffer() {
        // "Hello, world!" fits version 1 at Medium, 21 modules plus a border of 4.
        let img = generate_image_buffer("Hello, world!").unwrap();
        assert_eq!(img.dimensions(), (29, 29));
        assert_eq!(generate_image_buffer(""), Err(QrError::InvalidInput("input text is empty")));
    }

    #[test]
    fn test_save_png() {
        let dir = std::env::temp_dir().join(format!("qrgrid-test-{}", std::process::id()));
        let path = dir.join("nested").join("hello.png");
        save_png(&hello_world(), &path, 2, 4).unwrap();
        let img = image::open(&path).unwrap().into_luma8();
        assert_eq!(img.dimensions(), (58, 58));
        fs::remove_dir_all(&dir).unwrap();
    }
}
