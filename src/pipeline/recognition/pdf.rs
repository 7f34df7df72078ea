use super::types::PdfTextSource;
use super::RecognitionError;

/// Digital-PDF text source backed by the pdf-extract crate.
/// Handles PDFs with an embedded text layer; scanned PDFs come back empty
/// and are routed through the image strategies instead.
pub struct PdfExtractTextSource;

impl PdfTextSource for PdfExtractTextSource {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, RecognitionError> {
        pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
            .map_err(|e| RecognitionError::PdfParsing(e.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod test_pdf {
    /// Build a minimal one-page PDF with the given text, using lopdf
    /// (the library pdf-extract itself parses with).
    pub fn make_test_pdf(text: &str) -> Vec<u8> {
        use lopdf::dictionary;
        use lopdf::{Document, Object, Stream};

        let mut doc = Document::with_version("1.4");

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let content = format!("BT /F1 12 Tf 100 700 Td ({text}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

        let resources = dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        };

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => resources,
        });

        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        });

        if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(page_id) {
            dict.set("Parent", pages_id);
        }

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }
}
