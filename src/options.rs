use std::str::FromStr;

use crate::error::ExtractError;
use crate::model::{DetectedColumn, ExternalTimeLabel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    AutoDetect,
    Calendar,
    Tabular,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityMode {
    BestEffort,
    Strict,
    SkipAmbiguous,
}

/// A hand-edited column boundary in the form `name:x_start,x_end`.
///
/// An empty name leaves the clinician unset; the name `time` marks the shared time-label
/// column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub name: Option<String>,
    pub x_start: f32,
    pub x_end: f32,
}

impl ColumnSpec {
    #[must_use]
    pub fn is_time_column(&self) -> bool {
        self.name
            .as_deref()
            .is_some_and(|name| name.eq_ignore_ascii_case("time"))
    }

    #[must_use]
    pub fn to_column(&self, index: usize, image_width: f32) -> DetectedColumn {
        if self.is_time_column() {
            return DetectedColumn::time_column(self.x_start, self.x_end, image_width);
        }
        DetectedColumn::new(
            format!("column-{}", index + 1),
            self.name.clone(),
            self.x_start,
            self.x_end,
            image_width,
        )
    }
}

impl FromStr for ColumnSpec {
    type Err = String;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let (name_part, range_part) = spec
            .rsplit_once(':')
            .ok_or_else(|| format!("invalid column format '{spec}', expected name:x_start,x_end"))?;

        let parts = range_part.split(',').map(str::trim).collect::<Vec<_>>();
        if parts.len() != 2 {
            return Err(format!(
                "invalid column format '{spec}', expected exactly 2 coordinates"
            ));
        }

        let x_start: f32 = parts[0]
            .parse()
            .map_err(|_| format!("invalid x_start coordinate: '{}'", parts[0]))?;
        let x_end: f32 = parts[1]
            .parse()
            .map_err(|_| format!("invalid x_end coordinate: '{}'", parts[1]))?;

        if x_start < 0.0 || x_end <= x_start {
            return Err("column requires 0<=x_start<x_end".to_string());
        }

        let name = name_part.trim();
        Ok(Self {
            name: (!name.is_empty()).then(|| name.to_string()),
            x_start,
            x_end,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    pub layout_mode: LayoutMode,
    pub quality_mode: QualityMode,
    /// Vertical tolerance for "same line" grouping and tabular rows, in pixels.
    pub line_tolerance: f32,
    /// Vertical window spanning one appointment card, in pixels.
    pub cluster_tolerance: f32,
    /// Top share of the image treated as the header band.
    pub header_band_fraction: f32,
    /// Left share of the image searched for time labels.
    pub time_region_fraction: f32,
    /// Max label distance when the labels belong to a single isolated column.
    pub isolated_time_distance: f32,
    /// Max label distance when one label set is shared by several clinician columns.
    pub shared_time_distance: f32,
    pub phone_gap: f32,
    pub meridiem_gap: f32,
    pub clinician_reach: f32,
    pub review_threshold: f32,
    pub delimiter: u8,
    /// Edited columns; empty means detect them.
    pub columns: Vec<DetectedColumn>,
    /// Time labels from an earlier extraction; empty means detect locally.
    pub time_labels: Vec<ExternalTimeLabel>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            layout_mode: LayoutMode::AutoDetect,
            quality_mode: QualityMode::BestEffort,
            line_tolerance: 15.0,
            cluster_tolerance: 70.0,
            header_band_fraction: 0.15,
            time_region_fraction: 0.30,
            isolated_time_distance: 100.0,
            shared_time_distance: 80.0,
            phone_gap: 50.0,
            meridiem_gap: 30.0,
            clinician_reach: 250.0,
            review_threshold: 0.6,
            delimiter: b',',
            columns: Vec::new(),
            time_labels: Vec::new(),
        }
    }
}

impl ExtractOptions {
    pub fn validate(&self) -> Result<(), ExtractError> {
        let distances = [
            ("line_tolerance", self.line_tolerance),
            ("cluster_tolerance", self.cluster_tolerance),
            ("isolated_time_distance", self.isolated_time_distance),
            ("shared_time_distance", self.shared_time_distance),
            ("phone_gap", self.phone_gap),
            ("meridiem_gap", self.meridiem_gap),
            ("clinician_reach", self.clinician_reach),
        ];
        for (name, value) in distances {
            if !value.is_finite() || value <= 0.0 {
                return Err(ExtractError::InvalidOption(format!(
                    "{name} must be a positive number of pixels"
                )));
            }
        }

        let fractions = [
            ("header_band_fraction", self.header_band_fraction),
            ("time_region_fraction", self.time_region_fraction),
        ];
        for (name, value) in fractions {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ExtractError::InvalidOption(format!(
                    "{name} must be in (0, 1]"
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.review_threshold) {
            return Err(ExtractError::InvalidOption(
                "review_threshold must be in [0, 1]".to_string(),
            ));
        }

        if let Some(column) = self
            .columns
            .iter()
            .find(|column| column.x_end <= column.x_start)
        {
            return Err(ExtractError::InvalidColumn(format!(
                "column '{}' has x_end <= x_start",
                column.id
            )));
        }

        Ok(())
    }
}
