//! Single-page PDFs from PNG and JPEG images.

use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use crate::pdf::images::jpeg_xobject;
use crate::{PdfToolsError, Result};

/// A4 in points, portrait.
pub const A4_PORTRAIT: (f32, f32) = (595.0, 842.0);

/// Fraction of the page the image may cover.
pub const PAGE_FILL: f32 = 0.9;

/// JPEG quality used for the embedded image.
pub const EMBED_QUALITY: u8 = 95;

/// Where an image lands on its page, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlacement {
    pub page_width: f32,
    pub page_height: f32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Fit a `width`×`height` image on A4, landscape when the image is wider
/// than tall, scaled to 90% of the limiting side and centered.
pub fn place_image(width: u32, height: u32) -> ImagePlacement {
    let (page_width, page_height) = if width > height {
        (A4_PORTRAIT.1, A4_PORTRAIT.0)
    } else {
        A4_PORTRAIT
    };

    let (w, h) = (width.max(1) as f32, height.max(1) as f32);
    let scale = (page_width / w).min(page_height / h) * PAGE_FILL;
    let (final_width, final_height) = (w * scale, h * scale);

    ImagePlacement {
        page_width,
        page_height,
        x: (page_width - final_width) / 2.0,
        y: (page_height - final_height) / 2.0,
        width: final_width,
        height: final_height,
    }
}

/// Decode PNG/JPEG bytes and lay them out as a one-page PDF.
pub fn image_to_pdf(bytes: &[u8]) -> Result<Document> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| PdfToolsError::image_processing_with_source(format!("Failed to decode image: {}", e), e))?;
    image_document(&img)
}

/// Lay out an already decoded image as a one-page PDF.
pub fn image_document(img: &DynamicImage) -> Result<Document> {
    let (xobject, width, height) = jpeg_xobject(img, EMBED_QUALITY)?;
    let placement = place_image(width, height);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let image_id = doc.add_object(xobject);

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    placement.width.into(),
                    0.into(),
                    0.into(),
                    placement.height.into(),
                    placement.x.into(),
                    placement.y.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im1".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = content
        .encode()
        .map_err(|e| PdfToolsError::merge_with_source("Failed to encode image page content", e))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            0.into(),
            0.into(),
            placement.page_width.into(),
            placement.page_height.into(),
        ],
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im1" => image_id },
        },
        "Contents" => content_id,
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([200, 10, 10, 128])));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        bytes
    }

    #[test]
    fn test_portrait_placement() {
        let placement = place_image(100, 200);
        assert_eq!((placement.page_width, placement.page_height), (595.0, 842.0));
        // Height limits: 842 / 200 = 4.21, times 0.9.
        assert!((placement.height - 842.0 * 0.9).abs() < 0.01);
        assert!((placement.y - 842.0 * 0.05).abs() < 0.01);
        assert!((placement.x * 2.0 + placement.width - 595.0).abs() < 0.01);
    }

    #[test]
    fn test_landscape_placement() {
        let placement = place_image(300, 100);
        assert_eq!((placement.page_width, placement.page_height), (842.0, 595.0));
        assert!((placement.width - 842.0 * 0.9).abs() < 0.01);
    }

    #[test]
    fn test_square_image_is_portrait() {
        let placement = place_image(50, 50);
        assert_eq!(placement.page_width, 595.0);
        assert!((placement.width - placement.height).abs() < 0.01);
    }

    #[test]
    fn test_image_to_pdf_single_page() {
        let mut doc = image_to_pdf(&png_bytes(64, 32)).unwrap();
        assert_eq!(doc.get_pages().len(), 1);

        let page_id = *doc.get_pages().values().next().unwrap();
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        assert_eq!(media_box[2].as_float().unwrap(), 842.0);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        assert!(Document::load_mem(&bytes).is_ok());
    }

    #[test]
    fn test_image_to_pdf_rejects_garbage() {
        let err = image_to_pdf(b"not an image").unwrap_err();
        assert!(matches!(err, PdfToolsError::ImageProcessing { .. }));
    }
}
