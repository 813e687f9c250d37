mod calendar;
mod cluster;
mod column_detect;
mod csv_out;
mod error;
mod fields;
mod fragment_merge;
mod layout;
mod model;
mod normalize;
mod ocr_reader;
mod options;
mod parser;
mod score;
mod tabular;
mod time_resolve;
mod warning;

use std::path::Path;

use serde::Serialize;

use crate::csv_out::{write_csv, write_csv_to_string};
use crate::model::PreparedPage;
use crate::normalize::normalize_appointment;
use crate::ocr_reader::prepare_page;
use crate::parser::AppointmentParser;
use crate::score::with_confidence;
use crate::warning::WarningCode;

pub use error::ExtractError;
pub use model::{
    BoundingBox, ColumnLayout, DetectedColumn, ExternalTimeLabel, Layout, OcrDocument,
    OcrFragment, ParsedAppointment, TextFragment, TimeLabel,
};
pub use ocr_reader::{read_ocr_document, read_ocr_document_from_bytes};
pub use options::{ColumnSpec, ExtractOptions, LayoutMode, QualityMode};
pub use warning::{ExtractWarning, WarningCode as ExtractWarningCode};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionReport {
    pub layout: Layout,
    pub columns: Vec<DetectedColumn>,
    pub appointments: Vec<ParsedAppointment>,
    pub appointment_count: usize,
    pub review_count: usize,
    pub warnings: Vec<ExtractWarning>,
}

struct PipelineOutput {
    parser: AppointmentParser,
    page: PreparedPage,
    appointments: Vec<ParsedAppointment>,
}

fn run_pipeline(
    document: &OcrDocument,
    options: &ExtractOptions,
    warnings: &mut Vec<ExtractWarning>,
) -> PipelineOutput {
    let page = prepare_page(document, options, warnings);
    let parser = AppointmentParser::select(&page, options, warnings);
    let appointments = parser
        .parse(&page, options, warnings)
        .into_iter()
        .map(normalize_appointment)
        .map(with_confidence)
        .collect::<Vec<_>>();

    tracing::info!(
        fragments = page.fragments.len(),
        layout = ?parser.layout(),
        appointments = appointments.len(),
        "appointment extraction completed"
    );

    PipelineOutput {
        parser,
        page,
        appointments,
    }
}

fn apply_quality_mode(
    appointments: Vec<ParsedAppointment>,
    options: &ExtractOptions,
    warnings: &mut Vec<ExtractWarning>,
) -> Result<Vec<ParsedAppointment>, ExtractError> {
    let mut out = Vec::with_capacity(appointments.len());

    for (index, appointment) in appointments.into_iter().enumerate() {
        if !appointment.needs_review(options.review_threshold) {
            out.push(appointment);
            continue;
        }

        match options.quality_mode {
            QualityMode::BestEffort => {
                warnings.push(
                    ExtractWarning::new(
                        WarningCode::LowConfidence,
                        "appointment confidence is low; flagged for review",
                    )
                    .with_row(index)
                    .with_confidence(appointment.confidence),
                );
                out.push(appointment);
            }
            QualityMode::Strict => {
                return Err(ExtractError::AmbiguousAppointment {
                    index,
                    confidence: appointment.confidence,
                });
            }
            QualityMode::SkipAmbiguous => {
                warnings.push(
                    ExtractWarning::new(
                        WarningCode::LowConfidence,
                        "skipping low-confidence appointment",
                    )
                    .with_row(index)
                    .with_confidence(appointment.confidence),
                );
            }
        }
    }

    Ok(out)
}

/// Columns and time labels for the column editor.
///
/// Tabular screenshots report no columns; their left-side time labels are still listed.
#[must_use]
pub fn detect_columns(document: &OcrDocument, options: &ExtractOptions) -> ColumnLayout {
    let mut warnings = Vec::new();
    let page = prepare_page(document, options, &mut warnings);
    AppointmentParser::select(&page, options, &mut warnings).column_layout(&page, options)
}

/// Time labels in percent form, reusable against other crops of the same screenshot.
#[must_use]
pub fn extract_time_labels(
    document: &OcrDocument,
    options: &ExtractOptions,
) -> Vec<ExternalTimeLabel> {
    let mut warnings = Vec::new();
    let page = prepare_page(document, options, &mut warnings);
    column_detect::edited_time_labels(&page, options, &options.columns)
        .iter()
        .map(|label| ExternalTimeLabel::from_local(label, page.size.height))
        .collect()
}

/// Normalized, scored appointments in visual order. Never fails; low quality shows up as low
/// confidence.
#[must_use]
pub fn parse_appointments(
    document: &OcrDocument,
    options: &ExtractOptions,
) -> Vec<ParsedAppointment> {
    run_pipeline(document, options, &mut Vec::new()).appointments
}

pub fn extract_appointments(
    document: &OcrDocument,
    options: &ExtractOptions,
) -> Result<ExtractionReport, ExtractError> {
    options.validate()?;

    let mut warnings = Vec::new();
    let output = run_pipeline(document, options, &mut warnings);
    let appointments = apply_quality_mode(output.appointments, options, &mut warnings)?;

    if appointments.is_empty() {
        warnings.push(ExtractWarning::new(
            WarningCode::NoAppointmentsDetected,
            "no appointments were detected in the screenshot",
        ));
    }

    let review_count = appointments
        .iter()
        .filter(|appointment| appointment.needs_review(options.review_threshold))
        .count();

    Ok(ExtractionReport {
        layout: output.parser.layout(),
        columns: output.parser.column_layout(&output.page, options).columns,
        appointment_count: appointments.len(),
        review_count,
        appointments,
        warnings,
    })
}

pub fn extract_ocr_json_to_csv(
    input_json: &Path,
    output_csv: &Path,
    options: &ExtractOptions,
) -> Result<ExtractionReport, ExtractError> {
    let document = read_ocr_document(input_json)?;
    let report = extract_appointments(&document, options)?;
    write_csv(
        output_csv,
        &report.appointments,
        options.delimiter,
        options.review_threshold,
    )?;
    Ok(report)
}

pub fn extract_ocr_json_bytes_to_csv_string(
    input_json: &[u8],
    options: &ExtractOptions,
) -> Result<(String, ExtractionReport), ExtractError> {
    let document = read_ocr_document_from_bytes(input_json)?;
    let report = extract_appointments(&document, options)?;
    let csv = report_to_csv_string(&report, options)?;
    Ok((csv, report))
}

pub fn report_to_csv_string(
    report: &ExtractionReport,
    options: &ExtractOptions,
) -> Result<String, ExtractError> {
    write_csv_to_string(
        &report.appointments,
        options.delimiter,
        options.review_threshold,
    )
}

pub fn report_to_json_string(report: &ExtractionReport) -> Result<String, ExtractError> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[cfg(test)]
mod tests {
    use super::apply_quality_mode;
    use crate::error::ExtractError;
    use crate::model::ParsedAppointment;
    use crate::options::{ExtractOptions, QualityMode};
    use crate::warning::WarningCode;

    fn appointments() -> Vec<ParsedAppointment> {
        let base = ParsedAppointment {
            patient_name: Some("Smith John".to_string()),
            patient_phone: None,
            appointment_time: Some("09:00".to_string()),
            appointment_type: None,
            clinician_name: None,
            confidence: 0.86,
        };
        vec![
            base.clone(),
            ParsedAppointment {
                confidence: 0.29,
                ..base
            },
        ]
    }

    #[test]
    fn best_effort_keeps_and_flags_low_confidence() {
        let mut warnings = Vec::new();
        let kept = apply_quality_mode(appointments(), &ExtractOptions::default(), &mut warnings)
            .expect("best effort never fails");
        assert_eq!(kept.len(), 2);
        assert_eq!(warnings[0].code, WarningCode::LowConfidence);
        assert_eq!(warnings[0].row, Some(1));
    }

    #[test]
    fn strict_rejects_low_confidence() {
        let options = ExtractOptions {
            quality_mode: QualityMode::Strict,
            ..ExtractOptions::default()
        };
        let error = apply_quality_mode(appointments(), &options, &mut Vec::new())
            .expect_err("strict mode should fail");
        assert!(matches!(
            error,
            ExtractError::AmbiguousAppointment { index: 1, .. }
        ));
    }

    #[test]
    fn skip_ambiguous_drops_low_confidence() {
        let options = ExtractOptions {
            quality_mode: QualityMode::SkipAmbiguous,
            ..ExtractOptions::default()
        };
        let mut warnings = Vec::new();
        let kept = apply_quality_mode(appointments(), &options, &mut warnings)
            .expect("skip mode never fails");
        assert_eq!(kept.len(), 1);
        assert_eq!(warnings.len(), 1);
    }
}
