use std::path::Path;

use schedule_ocr_extract::{OcrDocument, read_ocr_document_from_bytes};
use serde_json::{Value, json};

pub const FRAGMENT_HEIGHT: f32 = 20.0;

/// `(text, x, y, width)` of one OCR fragment.
pub type Fragment<'a> = (&'a str, f32, f32, f32);

pub fn ocr_json(image_size: Option<(f32, f32)>, fragments: &[Fragment<'_>]) -> Value {
    let fragments = fragments
        .iter()
        .map(|(text, x, y, width)| {
            json!({
                "text": text,
                "boundingBox": { "x": x, "y": y, "width": width, "height": FRAGMENT_HEIGHT },
            })
        })
        .collect::<Vec<_>>();
    let full_text = fragments
        .iter()
        .filter_map(|fragment| fragment["text"].as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let mut document = json!({ "fullText": full_text, "fragments": fragments });
    if let Some((width, height)) = image_size {
        document["imageWidth"] = json!(width);
        document["imageHeight"] = json!(height);
    }
    document
}

pub fn ocr_document(image_size: Option<(f32, f32)>, fragments: &[Fragment<'_>]) -> OcrDocument {
    let bytes = serde_json::to_vec(&ocr_json(image_size, fragments)).expect("fixture serializes");
    read_ocr_document_from_bytes(&bytes).expect("fixture should parse as OCR output")
}

pub fn write_ocr_json(
    path: &Path,
    image_size: Option<(f32, f32)>,
    fragments: &[Fragment<'_>],
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(path, serde_json::to_vec_pretty(&ocr_json(image_size, fragments))?)?;
    Ok(())
}

pub const CALENDAR_SIZE: (f32, f32) = (1200.0, 1000.0);

/// Two clinician columns with shared time labels on the left.
pub fn two_clinician_calendar() -> Vec<Fragment<'static>> {
    vec![
        ("Dr", 500.0, 50.0, 25.0),
        ("Smith", 530.0, 50.0, 60.0),
        ("Dr", 900.0, 50.0, 25.0),
        ("Jones", 930.0, 50.0, 60.0),
        ("9am", 40.0, 200.0, 40.0),
        ("10am", 40.0, 400.0, 40.0),
        ("SMITH", 520.0, 205.0, 60.0),
        ("John", 590.0, 205.0, 40.0),
        ("0412", 520.0, 230.0, 40.0),
        ("345", 565.0, 230.0, 30.0),
        ("678", 600.0, 230.0, 30.0),
        ("Follow", 520.0, 255.0, 55.0),
        ("Up", 580.0, 255.0, 25.0),
        ("LEE", 920.0, 405.0, 40.0),
        ("Mary", 970.0, 405.0, 45.0),
        ("New", 920.0, 430.0, 35.0),
        ("Patient", 960.0, 430.0, 60.0),
    ]
}

pub const TABULAR_SIZE: (f32, f32) = (800.0, 400.0);

pub fn tabular_day_list() -> Vec<Fragment<'static>> {
    vec![
        ("Time", 20.0, 20.0, 40.0),
        ("Patient", 120.0, 20.0, 60.0),
        ("Name", 185.0, 20.0, 40.0),
        ("Phone", 320.0, 20.0, 50.0),
        ("Type", 480.0, 20.0, 40.0),
        ("Clinician", 620.0, 20.0, 70.0),
        ("9:30", 20.0, 60.0, 35.0),
        ("am", 60.0, 60.0, 20.0),
        ("Jane", 120.0, 60.0, 40.0),
        ("Doe", 165.0, 60.0, 35.0),
        ("0412", 320.0, 60.0, 40.0),
        ("345", 365.0, 60.0, 30.0),
        ("678", 400.0, 60.0, 30.0),
        ("Review", 480.0, 60.0, 55.0),
        ("Dr", 620.0, 60.0, 20.0),
        ("Lee", 645.0, 60.0, 30.0),
        ("2pm", 20.0, 100.0, 30.0),
        ("BROWN", 120.0, 100.0, 60.0),
        ("Alan", 185.0, 100.0, 40.0),
        ("Consult", 480.0, 100.0, 60.0),
        ("Dr", 620.0, 100.0, 20.0),
        ("Lee", 645.0, 100.0, 30.0),
    ]
}
