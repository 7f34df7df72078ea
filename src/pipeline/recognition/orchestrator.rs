//! Multi-strategy recognition orchestrator.
//!
//! Turns a `RawDocument` into `ExtractedText` by trying enhancement
//! strategies in order, gating each attempt with the sufficiency check,
//! and falling back to an external recognizer when configured. The loop
//! never retries unboundedly: both strategy lists are fixed.

use image::DynamicImage;

use super::enhance::{self, Strategy, EMERGENCY_CONFIDENCE, EMERGENCY_STRATEGIES, STANDARD_STRATEGIES};
use super::render::EmbeddedImageRenderer;
use super::sufficiency::{self, thresholds};
use super::types::{
    ExtractedText, MediaKind, OcrEngine, PdfPageRenderer, PdfTextSource, RawDocument,
    RecognitionMethod, RemoteRecognizer,
};
use super::RecognitionError;

/// Confidence assigned to text recovered by the remote fallback service.
const REMOTE_CONFIDENCE: f32 = 0.75;

/// Best insufficient attempt seen so far, kept for graceful degradation.
struct BestEffort {
    text: String,
    confidence: f32,
    score: usize,
    strategy: Strategy,
}

pub struct RecognitionOrchestrator {
    ocr: Box<dyn OcrEngine + Send + Sync>,
    pdf: Box<dyn PdfTextSource + Send + Sync>,
    renderer: Box<dyn PdfPageRenderer + Send + Sync>,
    remote: Option<Box<dyn RemoteRecognizer + Send + Sync>>,
}

impl RecognitionOrchestrator {
    pub fn new(
        ocr: Box<dyn OcrEngine + Send + Sync>,
        pdf: Box<dyn PdfTextSource + Send + Sync>,
    ) -> Self {
        Self {
            ocr,
            pdf,
            renderer: Box::new(EmbeddedImageRenderer),
            remote: None,
        }
    }

    /// Swap in a different scanned-page renderer.
    pub fn with_page_renderer(mut self, renderer: Box<dyn PdfPageRenderer + Send + Sync>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Configure the external fallback recognizer.
    pub fn with_remote(mut self, remote: Box<dyn RemoteRecognizer + Send + Sync>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Produce text for a document, or fail with `NoUsableText` when even
    /// the degraded paths recover nothing.
    pub fn recognize(&self, doc: &RawDocument) -> Result<ExtractedText, RecognitionError> {
        match doc.kind {
            MediaKind::DigitalPdf => self.recognize_digital_pdf(doc),
            MediaKind::ScannedPdf => self.recognize_scanned_pdf(doc),
            MediaKind::Image => self.recognize_image(&doc.bytes),
            MediaKind::Structured => {
                // Structured input bypasses recognition; the processor
                // feeds it straight to the merger. Returning the raw text
                // keeps this entry point total.
                let text = String::from_utf8_lossy(&doc.bytes);
                Ok(ExtractedText::from_single_page(
                    &text,
                    RecognitionMethod::StructuredBypass,
                    thresholds::VERY_HIGH,
                ))
            }
        }
    }

    /// Digital PDFs skip image strategies entirely: direct text layer,
    /// confidence scaled by the ratio of pages that actually had text.
    fn recognize_digital_pdf(&self, doc: &RawDocument) -> Result<ExtractedText, RecognitionError> {
        let pages = self.pdf.extract_pages(&doc.bytes)?;
        let pages_with_text = pages.iter().filter(|p| !p.trim().is_empty()).count();

        if pages_with_text == 0 {
            tracing::warn!(
                document_id = %doc.id,
                "Digital PDF has no text layer, treating as scanned"
            );
            return self.recognize_scanned_pdf(doc);
        }

        let ratio = pages_with_text as f32 / pages.len().max(1) as f32;
        let confidence = thresholds::VERY_HIGH * ratio;
        tracing::info!(
            document_id = %doc.id,
            pages = pages.len(),
            confidence,
            "Digital PDF text extracted"
        );
        Ok(ExtractedText::from_pages(
            &pages,
            RecognitionMethod::PdfDirect,
            confidence,
        ))
    }

    /// Scanned PDFs: any usable text layer first, then the pages are
    /// rasterized and pushed through the image strategy loop, then the
    /// remote service gets the raw bytes.
    fn recognize_scanned_pdf(&self, doc: &RawDocument) -> Result<ExtractedText, RecognitionError> {
        let partial = self
            .pdf
            .extract_pages(&doc.bytes)
            .unwrap_or_default()
            .join("\n");

        if sufficiency::is_sufficient(&partial) {
            let mut text = ExtractedText::from_single_page(
                &partial,
                RecognitionMethod::PdfDirect,
                thresholds::LOW,
            );
            text.low_confidence = true;
            return Ok(text);
        }

        if let Some(text) = self.recognize_rendered_pages(doc) {
            return Ok(text);
        }

        if let Some(remote) = &self.remote {
            match remote.recognize(&doc.bytes) {
                Ok(remote_text) if !remote_text.trim().is_empty() => {
                    tracing::info!(document_id = %doc.id, "Remote recognition succeeded for scanned PDF");
                    return Ok(ExtractedText::from_single_page(
                        &remote_text,
                        RecognitionMethod::RemoteOcr,
                        REMOTE_CONFIDENCE,
                    ));
                }
                Ok(_) => tracing::warn!(document_id = %doc.id, "Remote recognition returned empty text"),
                Err(e) => tracing::warn!(document_id = %doc.id, error = %e, "Remote recognition failed, degrading"),
            }
        }

        if partial.trim().is_empty() {
            return Err(RecognitionError::NoUsableText);
        }

        let mut text = ExtractedText::from_single_page(
            &partial,
            RecognitionMethod::PdfDirect,
            thresholds::VERY_LOW,
        );
        text.low_confidence = true;
        Ok(text)
    }

    /// Rasterize the document's pages and push each through the image
    /// strategy loop. Pages that fail to render or recognize are skipped;
    /// `None` means no page produced text.
    fn recognize_rendered_pages(&self, doc: &RawDocument) -> Option<ExtractedText> {
        let count = match self.renderer.page_count(&doc.bytes) {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(
                    document_id = %doc.id,
                    error = %e,
                    "Scanned PDF page enumeration failed"
                );
                return None;
            }
        };

        let mut pages = Vec::new();
        let mut confidence = f32::MAX;
        let mut low_confidence = false;
        let mut method = RecognitionMethod::LocalOcr;

        for page in 0..count {
            let png = match self.renderer.render_page(&doc.bytes, page) {
                Ok(png) => png,
                Err(e) => {
                    tracing::warn!(document_id = %doc.id, page, error = %e, "Page rendering failed");
                    continue;
                }
            };
            match self.recognize_image(&png) {
                Ok(text) => {
                    confidence = confidence.min(text.confidence);
                    low_confidence |= text.low_confidence;
                    if text.method == RecognitionMethod::RemoteOcr {
                        method = RecognitionMethod::RemoteOcr;
                    }
                    pages.push(text.full_text());
                }
                Err(e) => {
                    tracing::warn!(document_id = %doc.id, page, error = %e, "Page recognition failed");
                }
            }
        }

        if pages.is_empty() {
            return None;
        }
        tracing::info!(
            document_id = %doc.id,
            pages = pages.len(),
            "Scanned PDF recognized from rendered pages"
        );
        let mut text = ExtractedText::from_pages(&pages, method, confidence);
        text.low_confidence = low_confidence;
        Some(text)
    }

    /// Image path: decode, upscale small scans, then walk the strategy
    /// lists until one attempt passes the sufficiency gate.
    fn recognize_image(&self, bytes: &[u8]) -> Result<ExtractedText, RecognitionError> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| RecognitionError::ImageDecode(e.to_string()))?;
        let img = enhance::upscale_if_small(decoded);

        let mut best: Option<BestEffort> = None;

        if let Some(text) = self.try_strategies(&img, STANDARD_STRATEGIES, None, &mut best)? {
            return Ok(text);
        }
        tracing::debug!("All standard strategies insufficient, trying emergency passes");
        if let Some(text) =
            self.try_strategies(&img, EMERGENCY_STRATEGIES, Some(EMERGENCY_CONFIDENCE), &mut best)?
        {
            return Ok(text);
        }

        // Remote fallback gets the best-scoring enhanced image.
        if let Some(remote) = &self.remote {
            let fallback_img = match &best {
                Some(b) => b.strategy.apply(&img),
                None => img.clone(),
            };
            let png = encode_png(&fallback_img)?;
            match remote.recognize(&png) {
                Ok(remote_text) if !remote_text.trim().is_empty() => {
                    tracing::info!("Remote recognition fallback succeeded");
                    return Ok(ExtractedText::from_single_page(
                        &remote_text,
                        RecognitionMethod::RemoteOcr,
                        REMOTE_CONFIDENCE,
                    ));
                }
                Ok(_) => tracing::warn!("Remote recognition returned empty text"),
                Err(e) => tracing::warn!(error = %e, "Remote recognition failed, degrading"),
            }
        }

        // Best-effort: downstream stages must tolerate partial text.
        match best {
            Some(b) if !b.text.trim().is_empty() => {
                tracing::warn!(
                    strategy = b.strategy.name(),
                    score = b.score,
                    "Recognition insufficient everywhere, returning best effort"
                );
                let mut text = ExtractedText::from_single_page(
                    &b.text,
                    RecognitionMethod::LocalOcr,
                    b.confidence.min(thresholds::VERY_LOW),
                );
                text.low_confidence = true;
                Ok(text)
            }
            _ => Err(RecognitionError::NoUsableText),
        }
    }

    /// Run one strategy list. Returns the first sufficient result, and
    /// keeps `best` updated with the strongest insufficient attempt.
    fn try_strategies(
        &self,
        img: &DynamicImage,
        strategies: &[Strategy],
        confidence_override: Option<f32>,
        best: &mut Option<BestEffort>,
    ) -> Result<Option<ExtractedText>, RecognitionError> {
        for &strategy in strategies {
            let enhanced = strategy.apply(img);
            let png = encode_png(&enhanced)?;

            let outcome = match self.ocr.recognize(&png) {
                Ok(o) => o,
                Err(e) => {
                    tracing::warn!(strategy = strategy.name(), error = %e, "OCR attempt failed");
                    continue;
                }
            };

            let score = sufficiency::signature_score(&outcome.text);
            tracing::debug!(
                strategy = strategy.name(),
                score,
                confidence = outcome.confidence,
                chars = outcome.text.len(),
                "Recognition attempt"
            );

            let confidence = confidence_override.unwrap_or(outcome.confidence);

            if sufficiency::is_sufficient(&outcome.text) {
                tracing::info!(strategy = strategy.name(), score, "Sufficient recognition");
                return Ok(Some(ExtractedText::from_single_page(
                    &outcome.text,
                    RecognitionMethod::LocalOcr,
                    confidence,
                )));
            }

            let better = match best {
                Some(b) => score > b.score || (score == b.score && confidence > b.confidence),
                None => true,
            };
            if better {
                *best = Some(BestEffort {
                    text: outcome.text,
                    confidence,
                    score,
                    strategy,
                });
            }
        }
        Ok(None)
    }
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, RecognitionError> {
    let mut buf = Vec::new();
    img.write_to(&mut buf, image::ImageOutputFormat::Png)
        .map_err(|e| RecognitionError::ImageDecode(e.to_string()))?;
    Ok(buf)
}
