use log::{info, warn};
use printpdf::image_crate::{DynamicImage, GenericImageView, Rgb, RgbImage};
use printpdf::path::PaintMode;
use printpdf::{
    Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference,
    Point, Rect,
};
use std::fs;
use std::io::{BufWriter, Cursor};
use std::path::{Path, PathBuf};

use crate::document::InvoiceDocument;
use crate::error::{AppError, Result};
use crate::export::fonts::{self, FontMetrics};
use crate::export::layout::{self, Op, PAGE_H, PAGE_W, Page};

const LOGO_DPI: f32 = 96.0;

fn pdf_err(e: impl std::fmt::Display) -> AppError {
    AppError::Pdf(e.to_string())
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// Renders the document to PDF bytes, one A4 portrait page per layout page.
/// Text is set in the embedded DejaVu Sans so any symbol it covers survives.
pub fn render(doc: &InvoiceDocument) -> Result<Vec<u8>> {
    let metrics = FontMetrics::embedded()?;
    let pages = layout::layout(doc, &metrics);
    let logo = doc.logo.as_ref().and_then(|logo| match logo.decode() {
        Ok(img) => Some(flatten_on_white(&img)),
        Err(e) => {
            warn!("Skipping logo {}: {}", logo.file_name, e);
            None
        }
    });

    let title = format!("Invoice {}", doc.number);
    let (pdf, first_page, first_layer) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
    let fonts = Fonts {
        regular: pdf
            .add_external_font(Cursor::new(fonts::REGULAR))
            .map_err(pdf_err)?,
        bold: pdf
            .add_external_font(Cursor::new(fonts::BOLD))
            .map_err(pdf_err)?,
    };

    for (i, page) in pages.iter().enumerate() {
        let layer = if i == 0 {
            pdf.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_idx, layer_idx) = pdf.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
            pdf.get_page(page_idx).get_layer(layer_idx)
        };
        draw_page(&layer, &fonts, page, logo.as_ref());
    }

    let mut writer = BufWriter::new(Vec::<u8>::new());
    pdf.save(&mut writer).map_err(pdf_err)?;
    writer.into_inner().map_err(pdf_err)
}

fn draw_page(layer: &PdfLayerReference, fonts: &Fonts, page: &Page, logo: Option<&DynamicImage>) {
    for op in &page.ops {
        match op {
            Op::Text {
                x,
                y,
                size,
                bold,
                text,
            } => {
                let font = if *bold { &fonts.bold } else { &fonts.regular };
                layer.use_text(text.as_str(), *size, Mm(*x), Mm(*y), font);
            }
            Op::Rule { x1, x2, y, thickness } => {
                layer.set_outline_color(gray(0.8));
                layer.set_outline_thickness(*thickness);
                layer.add_line(Line {
                    points: vec![
                        (Point::new(Mm(*x1), Mm(*y)), false),
                        (Point::new(Mm(*x2), Mm(*y)), false),
                    ],
                    is_closed: false,
                });
            }
            Op::Fill {
                x,
                y_top,
                w,
                h,
                gray: level,
            } => {
                layer.set_fill_color(gray(*level));
                let rect = Rect::new(Mm(*x), Mm(*y_top - *h), Mm(*x + *w), Mm(*y_top))
                    .with_mode(PaintMode::Fill);
                layer.add_rect(rect);
                layer.set_fill_color(gray(0.0));
            }
            Op::Logo {
                right,
                bottom,
                max_w,
                max_h,
            } => {
                if let Some(img) = logo {
                    draw_logo(layer, img, *right, *bottom, *max_w, *max_h);
                }
            }
        }
    }
}

fn gray(level: f32) -> Color {
    Color::Rgb(printpdf::Rgb::new(level, level, level, None))
}

fn draw_logo(
    layer: &PdfLayerReference,
    img: &DynamicImage,
    right: f32,
    bottom: f32,
    max_w: f32,
    max_h: f32,
) {
    let (px_w, px_h) = img.dimensions();
    let natural_w = px_w as f32 * 25.4 / LOGO_DPI;
    let natural_h = px_h as f32 * 25.4 / LOGO_DPI;
    let scale = (max_w / natural_w.max(0.1))
        .min(max_h / natural_h.max(0.1))
        .min(1.0);

    // Top-right aligned inside the box.
    let x = right - natural_w * scale;
    let y = bottom + max_h - natural_h * scale;
    Image::from_dynamic_image(img).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(Mm(y)),
            rotate: None,
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(LOGO_DPI),
        },
    );
}

/// The PDF image path has no alpha channel; composite onto white first.
fn flatten_on_white(img: &DynamicImage) -> DynamicImage {
    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, px) in rgba.enumerate_pixels() {
        let alpha = px[3] as f32 / 255.0;
        let blend = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        out.put_pixel(x, y, Rgb([blend(px[0]), blend(px[1]), blend(px[2])]));
    }
    DynamicImage::ImageRgb8(out)
}

/// Writes `Invoice-<number>.pdf` into `dir` and returns its path.
pub fn write_invoice_pdf(doc: &InvoiceDocument, dir: &Path) -> Result<PathBuf> {
    let bytes = render(doc)?;
    fs::create_dir_all(dir)?;
    let path = dir.join(doc.file_name());
    fs::write(&path, bytes)?;
    info!("PDF written to {:?}", path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::form::InvoiceForm;
    use crate::logo::{Logo, tests::tiny_png};
    use printpdf::image_crate::Rgba;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "invoice-generator-pdf-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn default_form_exports_single_named_file() {
        let dir = scratch("default");
        let form = InvoiceForm::new(&Settings::default());
        let path = write_invoice_pdf(&InvoiceDocument::from_form(&form), &dir).unwrap();

        assert_eq!(path.file_name().unwrap(), "Invoice-001.pdf");
        let entries: Vec<_> = fs::read_dir(&dir).unwrap().flatten().collect();
        assert_eq!(entries.len(), 1);
        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn renders_with_logo_and_many_pages() {
        let mut form = InvoiceForm::new(&Settings::default());
        form.set_logo(Logo::from_bytes("logo.png", tiny_png()));
        for _ in 0..80 {
            form.add_item();
        }
        let bytes = render(&InvoiceDocument::from_form(&form)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn unreadable_logo_is_skipped() {
        let mut form = InvoiceForm::new(&Settings::default());
        form.set_logo(Logo::from_bytes("logo.png", b"nope".to_vec()));
        assert!(render(&InvoiceDocument::from_form(&form)).is_ok());
    }

    #[test]
    fn non_ascii_names_and_currency_render() {
        let dir = scratch("unicode");
        let mut form = InvoiceForm::new(&Settings::default());
        form.recipient.name = "Zoë Ångström".into();
        form.issuer.address = "Straße 12 – 10115 Berlin".into();
        form.meta.currency = "GH₵".into();
        form.add_item();
        form.update_item(
            crate::model::ItemId(2),
            crate::items::ItemUpdate::Description("Café Müller, Łódź".into()),
        );
        let path = write_invoice_pdf(&InvoiceDocument::from_form(&form), &dir).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn transparent_pixels_become_white() {
        let mut img = printpdf::image_crate::RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        img.put_pixel(1, 0, Rgba([10, 20, 30, 255]));
        let flat = flatten_on_white(&DynamicImage::ImageRgba8(img)).to_rgb8();
        assert_eq!(flat.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(flat.get_pixel(1, 0), &Rgb([10, 20, 30]));
    }
}
