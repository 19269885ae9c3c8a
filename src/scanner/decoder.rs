use crate::scanner::camera::Frame;

/// Decodes a visual token from a frame. A frame without a readable code is a
/// non-match, never an error.
pub trait TokenDecoder: Send + Sync {
    fn decode(&self, frame: &Frame) -> Option<String>;
}

/// QR decoder backed by `rqrr`.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrDecoder;

impl TokenDecoder for QrDecoder {
    fn decode(&self, frame: &Frame) -> Option<String> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return None;
        }

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            width as usize,
            height as usize,
            |x, y| frame.get_pixel(x as u32, y as u32).0[0],
        );

        prepared
            .detect_grids()
            .into_iter()
            .filter_map(|grid| grid.decode().ok())
            .map(|(_, content)| content.trim().to_string())
            .find(|content| !content.is_empty())
    }
}
