//! Chart rasterization
//!
//! SVG markup is rasterized with resvg; the pixels are PNG-encoded with the
//! `png` crate.

use resvg::{tiny_skia, usvg};
use std::sync::{Arc, OnceLock};

use super::ExportError;
use crate::surface::RasterImage;

/// System fonts are loaded once per process
fn font_database() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    FONTS
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            Arc::new(db)
        })
        .clone()
}

/// Rasterize an SVG document at its intrinsic size
pub fn rasterize_svg(svg: &str) -> Result<RasterImage, ExportError> {
    let mut options = usvg::Options::default();
    options.fontdb = font_database();

    let tree = usvg::Tree::from_str(svg, &options).map_err(|e| ExportError::Raster(e.to_string()))?;
    let size = tree.size().to_int_size();

    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| ExportError::Raster(format!("invalid size {}x{}", size.width(), size.height())))?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    // tiny-skia stores premultiplied alpha
    let rgba = pixmap
        .pixels()
        .iter()
        .flat_map(|px| {
            let c = px.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();

    Ok(RasterImage {
        width: size.width(),
        height: size.height(),
        rgba,
    })
}

/// Encode a raster as PNG
pub fn encode_png(image: &RasterImage) -> Result<Vec<u8>, ExportError> {
    let mut buffer = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut buffer, image.width, image.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder
            .write_header()
            .map_err(|e| ExportError::Raster(e.to_string()))?
            .write_image_data(&image.rgba)
            .map_err(|e| ExportError::Raster(e.to_string()))?;
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    #[test]
    fn test_rasterize_solid_square() {
        let svg = "<svg xmlns='http://www.w3.org/2000/svg' width='4' height='3'>\
                   <rect width='4' height='3' fill='#ff0000'/></svg>";
        let image = rasterize_svg(svg).unwrap();

        assert_eq!((image.width, image.height), (4, 3));
        assert_eq!(image.rgba.len(), 4 * 3 * 4);
        assert_eq!(&image.rgba[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_invalid_svg() {
        assert!(matches!(
            rasterize_svg("not svg"),
            Err(ExportError::Raster(_))
        ));
    }

    #[test]
    fn test_encode_png_signature() {
        let image = RasterImage {
            width: 1,
            height: 1,
            rgba: vec![0, 255, 0, 255],
        };
        let bytes = encode_png(&image).unwrap();
        assert_eq!(&bytes[..8], &PNG_SIGNATURE);
    }
}
