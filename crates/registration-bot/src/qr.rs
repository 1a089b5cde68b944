//! QR code rendering to PNG data URIs.

use crate::error::AppResult;
use base64::{engine::general_purpose::STANDARD, Engine};
use image::{ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use std::io::Cursor;

/// Prefix of every data URI produced here.
pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Pixels per QR module.
const MODULE_SIZE: u32 = 4;

/// Render `data` as a QR code PNG.
pub fn render_png(data: &str) -> AppResult<Vec<u8>> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::M)?;
    let image = code
        .render::<Luma<u8>>()
        .quiet_zone(true)
        .module_dimensions(MODULE_SIZE, MODULE_SIZE)
        .build();

    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

/// Wrap PNG bytes in a base64 data URI.
pub fn png_data_uri(png: &[u8]) -> String {
    format!("{}{}", PNG_DATA_URI_PREFIX, STANDARD.encode(png))
}

/// Render `data` as a QR code data URI on the blocking pool.
pub async fn render_data_uri(data: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || render_png(&data).map(|png| png_data_uri(&png))).await?
}
