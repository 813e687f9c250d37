use std::path::Path;

use crate::error::ExtractError;
use crate::fragment_merge::merge_fragments;
use crate::model::{ImageSize, OcrDocument, OcrFragment, PreparedPage, TextFragment};
use crate::options::ExtractOptions;
use crate::warning::{ExtractWarning, WarningCode};

pub fn read_ocr_document(input_json: &Path) -> Result<OcrDocument, ExtractError> {
    let bytes = std::fs::read(input_json)?;
    read_ocr_document_from_bytes(&bytes)
}

pub fn read_ocr_document_from_bytes(input_json: &[u8]) -> Result<OcrDocument, ExtractError> {
    Ok(serde_json::from_slice(input_json)?)
}

fn to_fragment(fragment: &OcrFragment) -> Option<TextFragment> {
    let text = fragment.text.trim();
    let bounds = fragment.bounding_box;
    let finite = [bounds.x, bounds.y, bounds.width, bounds.height]
        .iter()
        .all(|value| value.is_finite());
    if text.is_empty() || !finite {
        return None;
    }

    Some(TextFragment::new(
        text,
        bounds.x,
        bounds.y,
        bounds.width.max(0.0),
        bounds.height.max(0.0),
    ))
}

fn image_size(
    document: &OcrDocument,
    fragments: &[TextFragment],
    warnings: &mut Vec<ExtractWarning>,
) -> ImageSize {
    let extent = |edge: fn(&TextFragment) -> f32| {
        fragments
            .iter()
            .map(edge)
            .fold(0.0_f32, f32::max)
    };

    let given = |value: Option<f32>| value.filter(|value| value.is_finite() && *value > 0.0);
    let width = given(document.image_width);
    let height = given(document.image_height);

    if (width.is_none() || height.is_none()) && !fragments.is_empty() {
        tracing::warn!(
            fragments = fragments.len(),
            "image dimensions missing; inferring from fragment extents"
        );
        warnings.push(ExtractWarning::new(
            WarningCode::ImageSizeInferred,
            "image dimensions missing from OCR output; using fragment extents",
        ));
    }

    ImageSize {
        width: width.unwrap_or_else(|| extent(TextFragment::right)),
        height: height.unwrap_or_else(|| extent(TextFragment::bottom)),
    }
}

pub(crate) fn prepare_page(
    document: &OcrDocument,
    options: &ExtractOptions,
    warnings: &mut Vec<ExtractWarning>,
) -> PreparedPage {
    let fragments = document
        .fragments
        .iter()
        .filter_map(to_fragment)
        .collect::<Vec<_>>();
    let size = image_size(document, &fragments, warnings);

    PreparedPage {
        fragments: merge_fragments(&fragments, options),
        size,
    }
}
