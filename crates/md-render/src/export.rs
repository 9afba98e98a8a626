use crate::error::RenderError;
use tiny_skia::Pixmap;

/// Encode a rendered surface as PNG.
pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>, RenderError> {
    pixmap
        .encode_png()
        .map_err(|e| RenderError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_signature() {
        let pixmap = Pixmap::new(3, 2).unwrap();
        let bytes = encode_png(&pixmap).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}
