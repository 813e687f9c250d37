use serde::{Deserialize, Serialize};

/// One OCR-recognized token and its bounding box in source-image pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl TextFragment {
    #[must_use]
    pub fn new(text: impl Into<String>, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[must_use]
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub(crate) fn hull(parts: &[&TextFragment], text: String) -> Self {
        let x = parts.iter().map(|part| part.x).fold(f32::INFINITY, f32::min);
        let y = parts.iter().map(|part| part.y).fold(f32::INFINITY, f32::min);
        let right = parts
            .iter()
            .map(|part| part.right())
            .fold(f32::NEG_INFINITY, f32::max);
        let bottom = parts
            .iter()
            .map(|part| part.bottom())
            .fold(f32::NEG_INFINITY, f32::max);

        Self {
            text,
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrFragment {
    pub text: String,
    pub bounding_box: BoundingBox,
}

/// Output of the OCR collaborator for one screenshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrDocument {
    #[serde(default)]
    pub full_text: String,
    #[serde(default)]
    pub fragments: Vec<OcrFragment>,
    #[serde(default)]
    pub image_width: Option<f32>,
    #[serde(default)]
    pub image_height: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageSize {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PreparedPage {
    pub fragments: Vec<TextFragment>,
    pub size: ImageSize,
}

impl PreparedPage {
    pub(crate) fn header_band_limit(&self, fraction: f32) -> f32 {
        self.size.height * fraction
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Calendar,
    Tabular,
}

/// A clinician column (or the shared time-label column) of a calendar view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedColumn {
    pub id: String,
    pub clinician_name: Option<String>,
    pub x_start: f32,
    pub x_end: f32,
    pub x_start_percent: f32,
    pub x_end_percent: f32,
    pub is_time_column: bool,
}

impl DetectedColumn {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        clinician_name: Option<String>,
        x_start: f32,
        x_end: f32,
        image_width: f32,
    ) -> Self {
        Self {
            id: id.into(),
            clinician_name,
            x_start,
            x_end,
            x_start_percent: width_percent(x_start, image_width),
            x_end_percent: width_percent(x_end, image_width),
            is_time_column: false,
        }
    }

    #[must_use]
    pub fn time_column(x_start: f32, x_end: f32, image_width: f32) -> Self {
        Self {
            is_time_column: true,
            ..Self::new("time", None, x_start, x_end, image_width)
        }
    }

    /// True when the fragment's horizontal centre falls inside `[x_start, x_end)`.
    #[must_use]
    pub fn contains(&self, fragment: &TextFragment) -> bool {
        let center = fragment.center_x();
        center >= self.x_start && center < self.x_end
    }
}

fn width_percent(px: f32, image_width: f32) -> f32 {
    if image_width <= 0.0 {
        return 0.0;
    }
    (px / image_width * 100.0).round().clamp(0.0, 100.0)
}

/// Column detection result handed to the column editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnLayout {
    pub layout: Layout,
    pub columns: Vec<DetectedColumn>,
    pub time_labels: Vec<TimeLabel>,
}

/// A recognized time-of-day used as a vertical reference point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeLabel {
    pub time: String,
    pub y: f32,
}

/// Resolution independent time label, reusable against another crop of the same image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalTimeLabel {
    pub time: String,
    pub y_percent: f32,
}

impl ExternalTimeLabel {
    pub(crate) fn from_local(label: &TimeLabel, image_height: f32) -> Self {
        let y_percent = if image_height > 0.0 {
            label.y / image_height * 100.0
        } else {
            0.0
        };
        Self {
            time: label.time.clone(),
            y_percent,
        }
    }

    pub(crate) fn to_local(&self, image_height: f32) -> TimeLabel {
        TimeLabel {
            time: self.time.clone(),
            y: self.y_percent / 100.0 * image_height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedAppointment {
    pub patient_name: Option<String>,
    pub patient_phone: Option<String>,
    pub appointment_time: Option<String>,
    pub appointment_type: Option<String>,
    pub clinician_name: Option<String>,
    pub confidence: f32,
}

impl ParsedAppointment {
    #[must_use]
    pub fn needs_review(&self, threshold: f32) -> bool {
        self.confidence < threshold
    }
}
