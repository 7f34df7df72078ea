//! Scanned-PDF page rendering.
//!
//! Scanned lab reports are usually PDFs whose pages are single image
//! XObjects (most often JPEG). `EmbeddedImageRenderer` pulls the largest
//! image off a page with lopdf and re-encodes it to PNG so the
//! enhancement strategies can treat it like any photographed report.

use image::ImageOutputFormat;
use lopdf::{Dictionary, Document, Object, ObjectId};

use super::types::PdfPageRenderer;
use super::RecognitionError;

pub struct EmbeddedImageRenderer;

impl PdfPageRenderer for EmbeddedImageRenderer {
    fn page_count(&self, pdf_bytes: &[u8]) -> Result<usize, RecognitionError> {
        Ok(load(pdf_bytes)?.page_iter().count())
    }

    fn render_page(&self, pdf_bytes: &[u8], page: usize) -> Result<Vec<u8>, RecognitionError> {
        let doc = load(pdf_bytes)?;
        let page_ids: Vec<ObjectId> = doc.page_iter().collect();
        let &page_id = page_ids.get(page).ok_or_else(|| {
            RecognitionError::PdfParsing(format!(
                "page {page} out of range ({} pages)",
                page_ids.len()
            ))
        })?;

        let stream = largest_image_stream(&doc, page_id)?;
        let img = stream_image(stream).ok_or_else(|| {
            RecognitionError::ImageDecode("unsupported page image encoding".into())
        })?;

        let mut png = Vec::new();
        img.write_to(&mut png, ImageOutputFormat::Png)
            .map_err(|e| RecognitionError::ImageDecode(e.to_string()))?;
        tracing::debug!(page, bytes = png.len(), "Rendered scanned page");
        Ok(png)
    }
}

fn load(pdf_bytes: &[u8]) -> Result<Document, RecognitionError> {
    Document::load_mem(pdf_bytes).map_err(|e| RecognitionError::PdfParsing(e.to_string()))
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn dict_entry<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Result<&'a Dictionary, RecognitionError> {
    let obj = dict.get(key).map_err(|_| {
        RecognitionError::PdfParsing(format!("missing /{}", String::from_utf8_lossy(key)))
    })?;
    resolve(doc, obj).as_dict().map_err(|_| {
        RecognitionError::PdfParsing(format!(
            "/{} is not a dictionary",
            String::from_utf8_lossy(key)
        ))
    })
}

fn is_image(dict: &Dictionary) -> bool {
    dict.get(b"Subtype")
        .map_or(false, |o| matches!(o, Object::Name(n) if n == b"Image"))
}

/// Walk /Resources -> /XObject and take the biggest image stream; the
/// main page scan dwarfs logos and stamps.
fn largest_image_stream<'a>(
    doc: &'a Document,
    page_id: ObjectId,
) -> Result<&'a lopdf::Stream, RecognitionError> {
    let page = doc
        .get_object(page_id)
        .ok()
        .and_then(|o| o.as_dict().ok())
        .ok_or_else(|| RecognitionError::PdfParsing("page is not a dictionary".into()))?;
    let resources = dict_entry(doc, page, b"Resources")?;
    let xobjects = dict_entry(doc, resources, b"XObject")?;

    let mut largest: Option<&lopdf::Stream> = None;
    for (_, obj) in xobjects.iter() {
        let Object::Stream(stream) = resolve(doc, obj) else {
            continue;
        };
        if !is_image(&stream.dict) {
            continue;
        }
        if largest.map_or(true, |prev| stream.content.len() > prev.content.len()) {
            largest = Some(stream);
        }
    }
    largest.ok_or_else(|| RecognitionError::PdfParsing("no page image found".into()))
}

/// Decode a stream's payload. DCTDecode content is a complete JPEG and
/// decodes directly, as do embedded TIFF/PNG payloads; FlateDecode raw
/// pixel data is rebuilt from the stream dictionary.
fn stream_image(stream: &lopdf::Stream) -> Option<image::DynamicImage> {
    let content = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    if let Ok(img) = image::load_from_memory(&content) {
        return Some(img);
    }
    raw_pixel_image(&stream.dict, &content)
}

/// Rebuild an image from raw pixels via /Width, /Height and /ColorSpace.
/// Only 8-bit gray and RGB are handled.
fn raw_pixel_image(dict: &Dictionary, pixels: &[u8]) -> Option<image::DynamicImage> {
    let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
    let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;
    let bits = dict
        .get(b"BitsPerComponent")
        .map_or(8, |o| o.as_i64().unwrap_or(8));
    if bits != 8 {
        return None;
    }

    let gray = dict
        .get(b"ColorSpace")
        .map_or(false, |o| matches!(o, Object::Name(n) if n == b"DeviceGray"));
    let len = width as usize * height as usize * if gray { 1 } else { 3 };
    if pixels.len() < len {
        return None;
    }

    if gray {
        image::GrayImage::from_raw(width, height, pixels[..len].to_vec())
            .map(image::DynamicImage::ImageLuma8)
    } else {
        image::RgbImage::from_raw(width, height, pixels[..len].to_vec())
            .map(image::DynamicImage::ImageRgb8)
    }
}

/// Renderer that serves pre-made page images; for tests and for hosts
/// that rasterize pages elsewhere.
pub struct MockPageRenderer {
    pages: Vec<Vec<u8>>,
}

impl MockPageRenderer {
    pub fn new(pages: Vec<Vec<u8>>) -> Self {
        Self { pages }
    }
}

impl PdfPageRenderer for MockPageRenderer {
    fn page_count(&self, _pdf_bytes: &[u8]) -> Result<usize, RecognitionError> {
        Ok(self.pages.len())
    }

    fn render_page(&self, _pdf_bytes: &[u8], page: usize) -> Result<Vec<u8>, RecognitionError> {
        self.pages
            .get(page)
            .cloned()
            .ok_or_else(|| RecognitionError::PdfParsing(format!("page {page} out of range")))
    }
}
