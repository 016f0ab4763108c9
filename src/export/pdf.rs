//! Single-image PDF documents
//!
//! Writes a one-page A4 PDF with the chart raster placed near the top-left
//! corner. The image is stored as an uncompressed DeviceRGB XObject.
//!
//! File layout:
//! ```text
//! %PDF-1.4
//! 1 0 obj Catalog        -> 2
//! 2 0 obj Pages          -> [3]
//! 3 0 obj Page           -> Resources /Im0 = 4, Contents = 5
//! 4 0 obj Image XObject  (width x height x 3 bytes)
//! 5 0 obj Content stream (draws /Im0)
//! xref / trailer / startxref / %%EOF
//! ```

use std::io::Write;

use super::ExportError;
use crate::surface::RasterImage;

/// A4 in points
const PAGE_WIDTH: f64 = 595.28;
const PAGE_HEIGHT: f64 = 841.89;

const POINTS_PER_MM: f64 = 72.0 / 25.4;

/// Where the image lands on the page, in millimetres from the top-left
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x_mm: f64,
    pub y_mm: f64,
    pub width_mm: f64,
    pub height_mm: f64,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            x_mm: 10.0,
            y_mm: 10.0,
            width_mm: 190.0,
            height_mm: 100.0,
        }
    }
}

/// Build a PDF containing only `image`
pub fn single_image_document(image: &RasterImage, placement: Placement) -> Result<Vec<u8>, ExportError> {
    let rgb = image.to_rgb();
    let expected = image.width as usize * image.height as usize * 3;
    if rgb.len() != expected {
        return Err(ExportError::Raster(format!(
            "raster has {} RGB bytes, expected {}",
            rgb.len(),
            expected
        )));
    }

    let width = placement.width_mm * POINTS_PER_MM;
    let height = placement.height_mm * POINTS_PER_MM;
    let x = placement.x_mm * POINTS_PER_MM;
    let y = PAGE_HEIGHT - placement.y_mm * POINTS_PER_MM - height;
    let content = format!("q\n{:.2} 0 0 {:.2} {:.2} {:.2} cm\n/Im0 Do\nQ\n", width, height, x, y);

    let mut out: Vec<u8> = Vec::with_capacity(rgb.len() + 1024);
    let mut offsets = Vec::with_capacity(5);

    out.write_all(b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n")?;

    offsets.push(out.len());
    out.write_all(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n")?;

    offsets.push(out.len());
    out.write_all(b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n")?;

    offsets.push(out.len());
    write!(
        out,
        "3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
         /Resources << /XObject << /Im0 4 0 R >> >> /Contents 5 0 R >>\nendobj\n",
        PAGE_WIDTH, PAGE_HEIGHT
    )?;

    offsets.push(out.len());
    write!(
        out,
        "4 0 obj\n<< /Type /XObject /Subtype /Image /Width {} /Height {} \
         /ColorSpace /DeviceRGB /BitsPerComponent 8 /Length {} >>\nstream\n",
        image.width,
        image.height,
        rgb.len()
    )?;
    out.write_all(&rgb)?;
    out.write_all(b"\nendstream\nendobj\n")?;

    offsets.push(out.len());
    write!(
        out,
        "5 0 obj\n<< /Length {} >>\nstream\n{}endstream\nendobj\n",
        content.len(),
        content
    )?;

    let xref_offset = out.len();
    write!(out, "xref\n0 {}\n", offsets.len() + 1)?;
    out.write_all(b"0000000000 65535 f \n")?;
    for offset in &offsets {
        write!(out, "{:010} 00000 n \n", offset)?;
    }
    write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        offsets.len() + 1,
        xref_offset
    )?;

    Ok(out)
}
