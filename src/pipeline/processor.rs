//! End-to-end document processing.
//!
//! `ReportProcessor` wires the stages together: recognition, redundant
//! extraction, consensus merging, validation, the rule engine, the
//! advanced calculators, and recommendation synthesis. Degradations
//! accumulate as limitations on the report; only recognition failure
//! and malformed structured input are fatal.

use std::thread;

use crate::pipeline::context::DemographicContext;
use crate::pipeline::extract::{
    self, structured, ExtractError, ExtractedDemographics, ExtractionAgent, NormalizationAgent,
    ParameterCandidate, ReconstructionAgent, TabularAgent,
};
use crate::pipeline::recognition::{
    ExtractedText, MediaKind, RawDocument, RecognitionError, RecognitionOrchestrator,
};
use crate::pipeline::recommend;
use crate::pipeline::report::{AnalysisReport, Limitation, RecognitionSummary};
use crate::pipeline::rules::{advanced, context as modifiers, patterns, risk};
use crate::pipeline::validate::{ReferenceTable, ValidateError, Validator};

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Recognition failed: {0}")]
    Recognition(#[from] RecognitionError),

    #[error("Structured input rejected: {0}")]
    Extract(#[from] ExtractError),

    #[error("Validation setup failed: {0}")]
    Validate(#[from] ValidateError),
}

pub struct ReportProcessor {
    orchestrator: RecognitionOrchestrator,
    validator: Validator,
}

impl ReportProcessor {
    /// Build a processor over the embedded reference table, or the file
    /// named by `HEMASCAN_RANGES` when that override is set.
    pub fn new(orchestrator: RecognitionOrchestrator) -> Result<Self, ProcessError> {
        let table = match crate::config::reference_table_path() {
            Some(path) => {
                tracing::info!(path = %path.display(), "Loading external reference table");
                ReferenceTable::from_file(&path)?
            }
            None => ReferenceTable::embedded()?,
        };
        Ok(Self {
            orchestrator,
            validator: Validator::new(table),
        })
    }

    /// Swap in a custom reference table.
    pub fn with_table(mut self, table: ReferenceTable) -> Self {
        self.validator = Validator::new(table);
        self
    }

    /// Run the full pipeline over one document.
    pub fn process(
        &self,
        doc: &RawDocument,
        context: DemographicContext,
    ) -> Result<AnalysisReport, ProcessError> {
        tracing::info!(document_id = %doc.id, kind = ?doc.kind, "Processing document");
        let mut limitations = Vec::new();

        let (candidates, demographics, recognition) = if doc.kind == MediaKind::Structured {
            (structured::parse(&doc.bytes)?, ExtractedDemographics::default(), None)
        } else {
            let text = self.orchestrator.recognize(doc)?;
            if text.low_confidence {
                limitations.push(Limitation::new(
                    "recognition",
                    "Text was recovered at low confidence; readings may be incomplete",
                ));
            }
            let summary = RecognitionSummary {
                method: format!("{:?}", text.method),
                confidence: text.confidence,
                low_confidence: text.low_confidence,
                line_count: text.lines.len(),
            };
            let (candidates, demographics) = run_agents(&text);
            (candidates, demographics, Some(summary))
        };

        let context = context.merged_with_extracted(demographics.age, demographics.gender);

        let mut records = extract::merge(candidates);
        limitations.extend(self.validator.validate(&mut records, &context));

        let (findings, pattern_limitations) = patterns::detect(&records);
        limitations.extend(pattern_limitations);

        let mut risks = risk::assess(&records);
        modifiers::apply(&mut risks, &records, &context);

        let advanced = advanced::analyze(&records, &context);
        let recommendations = recommend::synthesize(&findings, &risks, advanced.as_ref());

        tracing::info!(
            document_id = %doc.id,
            parameters = records.len(),
            findings = findings.len(),
            recommendations = recommendations.len(),
            "Document processed"
        );

        Ok(AnalysisReport {
            document_id: doc.id,
            generated_at: chrono::Utc::now(),
            recognition,
            parameters: records,
            findings,
            risks,
            recommendations,
            advanced,
            limitations,
        })
    }
}

/// Run the three extraction agents concurrently over the same text.
/// Reconstruction runs on the calling thread since it also yields the
/// demographic side output.
fn run_agents(text: &ExtractedText) -> (Vec<ParameterCandidate>, ExtractedDemographics) {
    thread::scope(|scope| {
        let tabular = scope.spawn(|| TabularAgent::new().extract(text));
        let normalization = scope.spawn(|| NormalizationAgent::new().extract(text));

        let (mut candidates, demographics) =
            ReconstructionAgent::new().extract_with_demographics(text);

        // A panicking agent is a bug, not a degraded input; propagate it.
        match tabular.join() {
            Ok(found) => candidates.extend(found),
            Err(payload) => std::panic::resume_unwind(payload),
        }
        match normalization.join() {
            Ok(found) => candidates.extend(found),
            Err(payload) => std::panic::resume_unwind(payload),
        }

        (candidates, demographics)
    })
}
