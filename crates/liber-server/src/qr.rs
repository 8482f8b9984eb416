//! QR artifact rendering.

use std::io::Cursor;

use image::{ImageFormat, Luma};
use qrcode::QrCode;

use crate::error::{Result, ServerError};

/// Render `url` into a PNG-encoded QR code.
pub fn render_png(url: &str) -> Result<Vec<u8>> {
    let code = QrCode::new(url.as_bytes())
        .map_err(|e| ServerError::Internal(format!("qr encoding: {e}")))?;
    let img = code.render::<Luma<u8>>().min_dimensions(240, 240).build();

    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| ServerError::Internal(format!("png encoding: {e}")))?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_png_produces_png_bytes() {
        let png = render_png("http://localhost:8000/take/1/").unwrap();
        // PNG magic number
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_distinct_urls_render_distinct_codes() {
        let a = render_png("http://localhost:8000/take/1/").unwrap();
        let b = render_png("http://localhost:8000/take/2/").unwrap();
        assert_ne!(a, b);
    }
}
