//! Payment QR codes.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;
use thiserror::Error;

/// Smallest edge, in pixels, of a generated code.
const MIN_DIMENSION: u32 = 256;

#[derive(Debug, Error)]
pub enum QrError {
    #[error("could not encode QR data: {0}")]
    Encode(#[from] qrcode::types::QrError),
    #[error("could not write PNG: {0}")]
    Png(#[from] image::ImageError),
}

/// Render `data` (a wallet address or payment URI) as a PNG QR code.
///
/// # Errors
///
/// Fails if `data` is too long for a QR code or PNG encoding fails.
pub fn payment_qr_png(data: &str) -> Result<Vec<u8>, QrError> {
    let code = QrCode::new(data.as_bytes())?;
    let img = code
        .render::<Luma<u8>>()
        .min_dimensions(MIN_DIMENSION, MIN_DIMENSION)
        .build();

    let mut png = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(img).write_to(&mut png, ImageFormat::Png)?;
    Ok(png.into_inner())
}
