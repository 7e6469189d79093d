// Image resolution capability
// The crate performs no file I/O: the host hands out rasters by name.

use std::sync::Arc;

/// A decoded image as provided by the host
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    /// RGBA8 pixel data, opaque to this crate
    pub pixels: Arc<[u8]>,
}

impl Raster {
    pub fn new(width: u32, height: u32, pixels: impl Into<Arc<[u8]>>) -> Self {
        Raster {
            width,
            height,
            pixels: pixels.into(),
        }
    }

    /// A raster that only carries dimensions
    pub fn blank(width: u32, height: u32) -> Self {
        Raster::new(width, height, Vec::new())
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

pub trait ImageSource {
    /// Resolve an image by the name used in the markup
    fn resolve_image(&self, filename: &str) -> Option<Raster>;
}

impl<F> ImageSource for F
where
    F: Fn(&str) -> Option<Raster>,
{
    fn resolve_image(&self, filename: &str) -> Option<Raster> {
        self(filename)
    }
}
