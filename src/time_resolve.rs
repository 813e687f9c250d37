use std::sync::LazyLock;

use regex::Regex;

use crate::model::TimeLabel;

static EMBEDDED_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(1[0-2]|0?[1-9]):?([0-5][0-9])?\s?(am|pm)\b")
        .expect("hardcoded 12-hour time regex is valid")
});
static TWENTY_FOUR_HOUR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([01]?[0-9]|2[0-3]):[0-5][0-9]\b").expect("hardcoded 24-hour time regex is valid")
});
static TIME_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(?:1[0-2]|0?[1-9])(?::?[0-5][0-9])?\s?(?:am|pm)|(?:[01]?[0-9]|2[0-3]):[0-5][0-9])$")
        .expect("hardcoded time label regex is valid")
});

pub(crate) fn embedded_time(text: &str) -> Option<&str> {
    EMBEDDED_TIME_RE.find(text).map(|found| found.as_str())
}

pub(crate) fn any_time(text: &str) -> Option<&str> {
    embedded_time(text).or_else(|| TWENTY_FOUR_HOUR_RE.find(text).map(|found| found.as_str()))
}

pub(crate) fn is_time_label(text: &str) -> bool {
    TIME_LABEL_RE.is_match(text.trim())
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct TimeReference<'a> {
    pub labels: &'a [TimeLabel],
    pub max_distance: f32,
}

impl TimeReference<'_> {
    pub(crate) fn nearest(&self, y: f32) -> Option<&TimeLabel> {
        self.labels
            .iter()
            .map(|label| (label, (label.y - y).abs()))
            .min_by(|left, right| left.1.total_cmp(&right.1))
            .filter(|(_, distance)| *distance <= self.max_distance)
            .map(|(label, _)| label)
    }
}

pub(crate) fn resolve_time(text: &str, min_y: f32, reference: TimeReference<'_>) -> Option<String> {
    if let Some(time) = embedded_time(text) {
        return Some(time.to_string());
    }
    reference.nearest(min_y).map(|label| label.time.clone())
}

#[cfg(test)]
mod tests {
    use super::{TimeReference, any_time, embedded_time, is_time_label, resolve_time};
    use crate::model::TimeLabel;

    fn labels() -> Vec<TimeLabel> {
        vec![
            TimeLabel {
                time: "09:00".to_string(),
                y: 200.0,
            },
            TimeLabel {
                time: "09:30".to_string(),
                y: 300.0,
            },
        ]
    }

    #[test]
    fn finds_embedded_twelve_hour_times() {
        assert_eq!(embedded_time("SMITH 9:30am Review"), Some("9:30am"));
        assert_eq!(embedded_time("at 10 PM"), Some("10 PM"));
        assert_eq!(embedded_time("0412 345 678"), None);
        assert_eq!(any_time("Jones 14:05"), Some("14:05"));
    }

    #[test]
    fn recognizes_whole_time_labels() {
        assert!(is_time_label("9am"));
        assert!(is_time_label("10:30 PM"));
        assert!(is_time_label("14:00"));
        assert!(!is_time_label("Dr"));
        assert!(!is_time_label("0412"));
        assert!(!is_time_label("9am Smith"));
    }

    #[test]
    fn embedded_time_wins_over_labels() {
        let labels = labels();
        let reference = TimeReference {
            labels: &labels,
            max_distance: 100.0,
        };
        assert_eq!(
            resolve_time("Smith 11am", 205.0, reference).as_deref(),
            Some("11am")
        );
    }

    #[test]
    fn nearest_label_within_threshold() {
        let labels = labels();
        let reference = TimeReference {
            labels: &labels,
            max_distance: 80.0,
        };
        assert_eq!(
            resolve_time("Smith", 290.0, reference).as_deref(),
            Some("09:30")
        );
        assert_eq!(resolve_time("Smith", 390.0, reference), None);
    }

    #[test]
    fn no_labels_means_no_time() {
        let reference = TimeReference {
            labels: &[],
            max_distance: 100.0,
        };
        assert_eq!(resolve_time("Smith", 200.0, reference), None);
    }
}
