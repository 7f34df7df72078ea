//! OCR engine implementations.
//!
//! Production hosts inject their own `OcrEngine` (Tesseract bindings, a
//! vendor SDK, ...) through the orchestrator's constructor; this crate
//! ships deterministic engines for tests and for hosts without local OCR.

use std::sync::Mutex;

use super::types::{OcrEngine, OcrOutcome};
use super::RecognitionError;

/// Engine that returns fixed text regardless of input.
pub struct MockOcrEngine {
    pub text: String,
    pub confidence: f32,
}

impl MockOcrEngine {
    pub fn new(text: &str, confidence: f32) -> Self {
        Self {
            text: text.to_string(),
            confidence,
        }
    }
}

impl OcrEngine for MockOcrEngine {
    fn recognize(&self, _image_png: &[u8]) -> Result<OcrOutcome, RecognitionError> {
        Ok(OcrOutcome {
            text: self.text.clone(),
            confidence: self.confidence,
        })
    }
}

/// Engine that replays a scripted sequence of outcomes, one per call.
/// Lets tests exercise the strategy loop: early attempts can return
/// garbage while a later one returns sufficient text.
pub struct ScriptedOcrEngine {
    script: Vec<OcrOutcome>,
    cursor: Mutex<usize>,
}

impl ScriptedOcrEngine {
    pub fn new(script: Vec<(&str, f32)>) -> Self {
        Self {
            script: script
                .into_iter()
                .map(|(text, confidence)| OcrOutcome {
                    text: text.to_string(),
                    confidence,
                })
                .collect(),
            cursor: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.cursor.lock().unwrap()
    }
}

impl OcrEngine for ScriptedOcrEngine {
    fn recognize(&self, _image_png: &[u8]) -> Result<OcrOutcome, RecognitionError> {
        let mut cursor = self.cursor.lock().unwrap();
        let outcome = self
            .script
            .get(*cursor)
            .or_else(|| self.script.last())
            .cloned()
            .ok_or_else(|| RecognitionError::OcrProcessing("empty script".into()))?;
        *cursor += 1;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_returns_configured_text() {
        let engine = MockOcrEngine::new("Hemoglobin 12.5", 0.9);
        let out = engine.recognize(b"png").unwrap();
        assert_eq!(out.text, "Hemoglobin 12.5");
        assert!((out.confidence - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn scripted_engine_advances_then_repeats_last() {
        let engine = ScriptedOcrEngine::new(vec![("garbage", 0.1), ("WBC 9000", 0.8)]);
        assert_eq!(engine.recognize(b"x").unwrap().text, "garbage");
        assert_eq!(engine.recognize(b"x").unwrap().text, "WBC 9000");
        assert_eq!(engine.recognize(b"x").unwrap().text, "WBC 9000");
        assert_eq!(engine.calls(), 3);
    }

    #[test]
    fn empty_script_errors() {
        let engine = ScriptedOcrEngine::new(vec![]);
        assert!(engine.recognize(b"x").is_err());
    }
}
