//! Embedded image handling.
//!
//! Only baseline DCT (JPEG) images in `DeviceRGB`/`DeviceGray` are
//! re-encoded; everything else is left exactly as it was.

use crate::Result;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

/// How embedded JPEGs are re-encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRecompression {
    pub quality: u8,
    /// Longest side in pixels; larger images are downsampled.
    pub max_dimension: Option<u32>,
}

/// Counters from a re-encoding pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImageReport {
    pub examined: usize,
    pub recompressed: usize,
    pub skipped: usize,
    pub bytes_saved: u64,
}

fn name_of(dict: &Dictionary, key: &[u8]) -> Option<Vec<u8>> {
    match dict.get(key).ok()? {
        Object::Name(name) => Some(name.clone()),
        Object::Array(items) if items.len() == 1 => match &items[0] {
            Object::Name(name) => Some(name.clone()),
            _ => None,
        },
        _ => None,
    }
}

fn is_image_xobject(stream: &Stream) -> bool {
    matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(name)) if name == b"Image")
}

/// Whether this image stream is a plain JPEG the encoder can round-trip.
fn is_recompressible_jpeg(stream: &Stream) -> bool {
    if !is_image_xobject(stream) {
        return false;
    }
    if name_of(&stream.dict, b"Filter").as_deref() != Some(b"DCTDecode".as_slice()) {
        return false;
    }
    if !matches!(
        name_of(&stream.dict, b"ColorSpace").as_deref(),
        Some(b"DeviceRGB") | Some(b"DeviceGray")
    ) {
        return false;
    }
    if stream.dict.has(b"Decode") || stream.dict.has(b"DecodeParms") {
        return false;
    }
    matches!(stream.dict.get(b"BitsPerComponent"), Ok(Object::Integer(8)))
}

/// Re-encode a JPEG, returning the new bytes and dimensions if they are smaller.
fn reencode_jpeg(
    data: &[u8],
    gray: bool,
    settings: ImageRecompression,
) -> Result<Option<(Vec<u8>, u32, u32)>> {
    let mut img = image::load_from_memory_with_format(data, ImageFormat::Jpeg)?;

    if let Some(max) = settings.max_dimension
        && (img.width() > max || img.height() > max)
    {
        img = img.resize(max, max, FilterType::Lanczos3);
    }

    let img = if gray {
        DynamicImage::ImageLuma8(img.to_luma8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    };

    let mut encoded = Vec::new();
    img.write_with_encoder(JpegEncoder::new_with_quality(&mut encoded, settings.quality))?;

    if encoded.len() >= data.len() {
        return Ok(None);
    }
    Ok(Some((encoded, img.width(), img.height())))
}

/// Re-encode every eligible JPEG in the document.
///
/// A failure on one image is logged and that image left untouched.
pub fn recompress_images(doc: &mut Document, settings: ImageRecompression) -> ImageReport {
    let mut report = ImageReport::default();

    let candidates: Vec<ObjectId> = doc
        .objects
        .iter()
        .filter_map(|(id, obj)| match obj {
            Object::Stream(stream) if is_image_xobject(stream) => Some(*id),
            _ => None,
        })
        .collect();

    for id in candidates {
        report.examined += 1;

        let Some(Object::Stream(stream)) = doc.objects.get_mut(&id) else {
            continue;
        };

        if !is_recompressible_jpeg(stream) {
            report.skipped += 1;
            continue;
        }

        let gray = name_of(&stream.dict, b"ColorSpace").as_deref() == Some(b"DeviceGray".as_slice());

        match reencode_jpeg(&stream.content, gray, settings) {
            Ok(Some((bytes, width, height))) => {
                report.bytes_saved += (stream.content.len() - bytes.len()) as u64;
                stream.dict.set("Width", Object::Integer(width as i64));
                stream.dict.set("Height", Object::Integer(height as i64));
                stream.set_content(bytes);
                report.recompressed += 1;
            }
            Ok(None) => {
                report.skipped += 1;
            }
            Err(e) => {
                tracing::warn!("Leaving image {:?} untouched: {}", id, e);
                report.skipped += 1;
            }
        }
    }

    report
}

/// Composite any alpha channel onto a white background.
pub fn flatten_onto_white(img: &DynamicImage) -> image::RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut flattened = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
    image::imageops::overlay(&mut flattened, &rgba, 0, 0);
    DynamicImage::ImageRgba8(flattened).to_rgb8()
}

/// Encode an image as a DCT image XObject stream.
pub fn jpeg_xobject(img: &DynamicImage, quality: u8) -> Result<(Stream, u32, u32)> {
    let rgb = flatten_onto_white(img);
    let (width, height) = rgb.dimensions();

    let mut jpeg_bytes = Vec::new();
    DynamicImage::ImageRgb8(rgb).write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg_bytes, quality))?;

    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(width as i64));
    dict.set("Height", Object::Integer(height as i64));
    dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
    dict.set("BitsPerComponent", Object::Integer(8));
    dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));

    Ok((Stream::new(dict, jpeg_bytes), width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn noisy_rgb(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x ^ y) % 256) as u8])
        }))
    }

    fn doc_with_jpeg(img: &DynamicImage, quality: u8) -> (Document, ObjectId) {
        let mut doc = Document::with_version("1.5");
        let (stream, _, _) = jpeg_xobject(img, quality).unwrap();
        let id = doc.add_object(stream);
        (doc, id)
    }

    #[test]
    fn test_jpeg_xobject_dictionary() {
        let (stream, width, height) = jpeg_xobject(&noisy_rgb(40, 20), 95).unwrap();
        assert_eq!((width, height), (40, 20));
        assert_eq!(stream.dict.get(b"Filter").unwrap().as_name().unwrap(), b"DCTDecode");
        assert_eq!(stream.dict.get(b"Width").unwrap().as_i64().unwrap(), 40);
        assert!(stream.content.starts_with(&[0xFF, 0xD8]));
    }

    #[test]
    fn test_flatten_onto_white() {
        let transparent = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 0])));
        let flat = flatten_onto_white(&transparent);
        assert_eq!(flat.get_pixel(0, 0), &Rgb([255, 255, 255]));

        let opaque = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255])));
        assert_eq!(flatten_onto_white(&opaque).get_pixel(1, 1), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_recompress_lowers_quality() {
        let (mut doc, id) = doc_with_jpeg(&noisy_rgb(256, 256), 98);
        let before = doc.get_object(id).unwrap().as_stream().unwrap().content.len();

        let report = recompress_images(
            &mut doc,
            ImageRecompression {
                quality: 40,
                max_dimension: None,
            },
        );

        let after = doc.get_object(id).unwrap().as_stream().unwrap().content.len();
        assert_eq!(report.examined, 1);
        assert_eq!(report.recompressed, 1);
        assert!(after < before);
        assert_eq!(report.bytes_saved, (before - after) as u64);
    }

    #[test]
    fn test_recompress_downsamples_large_images() {
        let (mut doc, id) = doc_with_jpeg(&noisy_rgb(400, 200), 95);

        recompress_images(
            &mut doc,
            ImageRecompression {
                quality: 60,
                max_dimension: Some(100),
            },
        );

        let stream = doc.get_object(id).unwrap().as_stream().unwrap();
        assert_eq!(stream.dict.get(b"Width").unwrap().as_i64().unwrap(), 100);
        assert_eq!(stream.dict.get(b"Height").unwrap().as_i64().unwrap(), 50);
    }

    #[test]
    fn test_non_jpeg_images_are_skipped() {
        let mut doc = Document::with_version("1.5");
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("Width", Object::Integer(1));
        dict.set("Height", Object::Integer(1));
        dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
        dict.set("BitsPerComponent", Object::Integer(8));
        let id = doc.add_object(Stream::new(dict, vec![0, 0, 0]));

        let report = recompress_images(
            &mut doc,
            ImageRecompression {
                quality: 10,
                max_dimension: None,
            },
        );

        assert_eq!(report.skipped, 1);
        assert_eq!(doc.get_object(id).unwrap().as_stream().unwrap().content, vec![0, 0, 0]);
    }

    #[test]
    fn test_corrupt_jpeg_is_left_alone() {
        let mut doc = Document::with_version("1.5");
        let mut dict = Dictionary::new();
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("ColorSpace", Object::Name(b"DeviceGray".to_vec()));
        dict.set("BitsPerComponent", Object::Integer(8));
        dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
        let id = doc.add_object(Stream::new(dict, vec![0xFF, 0xD8, 0x00, 0x01]));

        let report = recompress_images(
            &mut doc,
            ImageRecompression {
                quality: 50,
                max_dimension: None,
            },
        );

        assert_eq!(report.recompressed, 0);
        assert_eq!(report.skipped, 1);
        assert_eq!(doc.get_object(id).unwrap().as_stream().unwrap().content.len(), 4);
    }
}
