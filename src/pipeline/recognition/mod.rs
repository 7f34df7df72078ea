pub mod enhance;
pub mod ocr;
pub mod orchestrator;
pub mod pdf;
pub mod remote;
pub mod render;
pub mod sufficiency;
pub mod types;

pub use ocr::*;
pub use orchestrator::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecognitionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding failed: {0}")]
    ImageDecode(String),

    #[error("Local recognition failed: {0}")]
    OcrProcessing(String),

    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("Remote recognition service error: {0}")]
    RemoteService(String),

    #[error("Remote recognition timed out after {0}s")]
    RemoteTimeout(u64),

    #[error("No usable text could be recovered from the document")]
    NoUsableText,
}
