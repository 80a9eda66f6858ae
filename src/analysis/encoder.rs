use std::io::Cursor;

use base64::{engine::general_purpose, Engine as _};
use image::ImageFormat;

use crate::error::AnalysisError;

/// A captured image in transport form. `payload` is what goes into the
/// model request as an inline attachment; `data_url` carries the metadata
/// prefix needed for inline display and is what the history keeps.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub payload: String,
    pub data_url: String,
}

/// Decode whatever the client uploaded, normalize it to PNG and base64 it.
/// Deterministic for identical input bytes; unreadable input fails with
/// `Encoding` and is never retried.
pub fn encode_image(bytes: &[u8]) -> Result<EncodedImage, AnalysisError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| AnalysisError::Encoding(e.to_string()))?;

    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| AnalysisError::Encoding(e.to_string()))?;

    let payload = general_purpose::STANDARD.encode(&png);
    let data_url = format!("data:image/png;base64,{payload}");
    Ok(EncodedImage { payload, data_url })
}
