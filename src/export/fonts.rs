//! The embedded DejaVu Sans faces. The same bytes are embedded into the PDF
//! and measured here, so layout widths match what gets drawn.

use ttf_parser::Face;

use crate::error::{AppError, Result};

pub static REGULAR: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");
pub static BOLD: &[u8] = include_bytes!("../../assets/DejaVuSans-Bold.ttf");

const PT_TO_MM: f32 = 25.4 / 72.0;

pub struct FontMetrics {
    regular: Face<'static>,
    bold: Face<'static>,
}

impl FontMetrics {
    pub fn embedded() -> Result<Self> {
        let parse = |bytes: &'static [u8], name: &str| {
            Face::parse(bytes, 0)
                .map_err(|e| AppError::Pdf(format!("Failed to parse embedded font {}: {}", name, e)))
        };
        Ok(FontMetrics {
            regular: parse(REGULAR, "DejaVuSans")?,
            bold: parse(BOLD, "DejaVuSans-Bold")?,
        })
    }

    /// Advance width of `text` in millimetres. Characters the face lacks count as zero.
    pub fn width(&self, text: &str, size_pt: f32, bold: bool) -> f32 {
        let face = if bold { &self.bold } else { &self.regular };
        let units_per_em = face.units_per_em() as f32;
        if units_per_em <= 0.0 {
            return 0.0;
        }
        let units: u32 = text
            .chars()
            .filter_map(|ch| face.glyph_index(ch))
            .map(|gid| face.glyph_hor_advance(gid).unwrap_or(0) as u32)
            .sum();
        units as f32 / units_per_em * size_pt * PT_TO_MM
    }
}
