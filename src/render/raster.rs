use std::{io::Cursor, sync::Arc};

use anyhow::Context as _;

use crate::foundation::error::{PerfgraphError, PerfgraphResult};

/// Rasterizes chart SVG documents into PNG bytes.
///
/// The font database is loaded once and shared by every worker.
#[derive(Clone, Debug)]
pub struct Rasterizer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::with_system_fonts()
    }
}

impl Rasterizer {
    /// Rasterizer backed by the host's installed fonts.
    pub fn with_system_fonts() -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!(faces = db.len(), "loaded system fonts");
        Self {
            fontdb: Arc::new(db),
        }
    }

    /// Number of font faces available for text.
    pub fn font_faces(&self) -> usize {
        self.fontdb.len()
    }

    /// Render `svg` and encode the result as PNG.
    pub fn png_bytes(&self, svg: &str) -> PerfgraphResult<Vec<u8>> {
        let opts = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            ..usvg::Options::default()
        };
        let tree = usvg::Tree::from_str(svg, &opts).context("parse chart svg")?;

        let size = tree.size().to_int_size();
        let (width, height) = (size.width(), size.height());
        let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| PerfgraphError::render("failed to allocate chart pixmap"))?;
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::identity(),
            &mut pixmap.as_mut(),
        );

        let mut rgba = pixmap.take();
        demultiply_rgba8_in_place(&mut rgba);
        let img = image::RgbaImage::from_raw(width, height, rgba)
            .ok_or_else(|| PerfgraphError::render("pixmap size does not match chart size"))?;

        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .context("encode chart png")?;
        Ok(buf)
    }
}

fn demultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
