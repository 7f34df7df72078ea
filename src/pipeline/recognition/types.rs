use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::RecognitionError;

/// Declared media kind of an ingested document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// Photograph or scan image (JPEG/PNG/TIFF bytes).
    Image,
    /// PDF without a text layer; pages must be recognized as images.
    ScannedPdf,
    /// PDF with an embedded text layer.
    DigitalPdf,
    /// Already-structured data (JSON or CSV); bypasses recognition.
    Structured,
}

/// An ingested document. Immutable once created.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub id: Uuid,
    pub bytes: Vec<u8>,
    pub kind: MediaKind,
}

impl RawDocument {
    pub fn new(bytes: Vec<u8>, kind: MediaKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            bytes,
            kind,
        }
    }
}

/// How the text was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecognitionMethod {
    LocalOcr,
    RemoteOcr,
    PdfDirect,
    StructuredBypass,
}

/// A single recognized line with positional metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextLine {
    pub page: usize,
    pub index: usize,
    pub text: String,
}

/// Recognized document text, consumed read-only by all extraction agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedText {
    pub lines: Vec<TextLine>,
    pub method: RecognitionMethod,
    pub confidence: f32,
    /// Set when every enhancement strategy was insufficient and the text is
    /// a best-effort result; downstream stages must tolerate gaps.
    pub low_confidence: bool,
}

impl ExtractedText {
    /// Split page texts into positional lines, skipping blank ones.
    pub fn from_pages(pages: &[String], method: RecognitionMethod, confidence: f32) -> Self {
        let mut lines = Vec::new();
        for (page_idx, page) in pages.iter().enumerate() {
            for (line_idx, line) in page.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                lines.push(TextLine {
                    page: page_idx + 1,
                    index: line_idx,
                    text: line.to_string(),
                });
            }
        }
        Self {
            lines,
            method,
            confidence,
            low_confidence: false,
        }
    }

    pub fn from_single_page(text: &str, method: RecognitionMethod, confidence: f32) -> Self {
        Self::from_pages(&[text.to_string()], method, confidence)
    }

    pub fn full_text(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&line.text);
            out.push('\n');
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Result of one local recognition attempt.
#[derive(Debug, Clone)]
pub struct OcrOutcome {
    pub text: String,
    pub confidence: f32,
}

/// Local text-recognition engine. Implementations receive PNG-encoded
/// image bytes produced by the enhancement stage.
pub trait OcrEngine {
    fn recognize(&self, image_png: &[u8]) -> Result<OcrOutcome, RecognitionError>;
}

/// Digital-PDF text source: returns one string per page.
pub trait PdfTextSource {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, RecognitionError>;
}

/// Rasterizes scanned-PDF pages so they can enter the image pipeline.
pub trait PdfPageRenderer {
    fn page_count(&self, pdf_bytes: &[u8]) -> Result<usize, RecognitionError>;
    /// PNG bytes for one zero-based page.
    fn render_page(&self, pdf_bytes: &[u8], page: usize) -> Result<Vec<u8>, RecognitionError>;
}

/// External fallback recognizer: image bytes in, text out, best-effort.
pub trait RemoteRecognizer {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, RecognitionError>;
}
