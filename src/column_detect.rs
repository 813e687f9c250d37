use crate::layout::{header_band, is_doctor_token};
use crate::model::{ColumnLayout, DetectedColumn, Layout, PreparedPage, TextFragment, TimeLabel};
use crate::normalize::normalize_time;
use crate::options::ExtractOptions;
use crate::time_resolve::is_time_label;
use crate::warning::{ExtractWarning, WarningCode};

const TIME_COLUMN_MIN_LABELS: usize = 2;
const TIME_COLUMN_LEFT_PADDING: f32 = 10.0;
const TIME_COLUMN_RIGHT_PADDING: f32 = 20.0;
const CLINICIAN_ROW_TOLERANCE: f32 = 20.0;
const DUPLICATE_HEADER_DISTANCE: f32 = 1.0;

fn time_labels_where<'a>(
    page: &'a PreparedPage,
    options: &ExtractOptions,
    in_region: impl Fn(&TextFragment) -> bool,
) -> Vec<(&'a TextFragment, TimeLabel)> {
    let header_limit = page.header_band_limit(options.header_band_fraction);

    let mut labels = page
        .fragments
        .iter()
        .filter(|fragment| fragment.y >= header_limit && in_region(fragment))
        .filter(|fragment| is_time_label(&fragment.text))
        .filter_map(|fragment| {
            normalize_time(&fragment.text).map(|time| {
                (
                    fragment,
                    TimeLabel {
                        time,
                        y: fragment.y,
                    },
                )
            })
        })
        .collect::<Vec<_>>();
    labels.sort_by(|left, right| left.1.y.total_cmp(&right.1.y));
    labels
}

fn time_label_fragments<'a>(
    page: &'a PreparedPage,
    options: &ExtractOptions,
) -> Vec<(&'a TextFragment, TimeLabel)> {
    let region_end = page.size.width * options.time_region_fraction;
    time_labels_where(page, options, |fragment| fragment.x < region_end)
}

pub(crate) fn detect_time_labels(page: &PreparedPage, options: &ExtractOptions) -> Vec<TimeLabel> {
    time_label_fragments(page, options)
        .into_iter()
        .map(|(_, label)| label)
        .collect()
}

pub(crate) fn edited_time_labels(
    page: &PreparedPage,
    options: &ExtractOptions,
    columns: &[DetectedColumn],
) -> Vec<TimeLabel> {
    let time_columns = columns
        .iter()
        .filter(|column| column.is_time_column)
        .collect::<Vec<_>>();
    if time_columns.is_empty() {
        return detect_time_labels(page, options);
    }

    time_labels_where(page, options, |fragment| {
        time_columns.iter().any(|column| column.contains(fragment))
    })
    .into_iter()
    .map(|(_, label)| label)
    .collect()
}

fn time_hull(labels: &[(&TextFragment, TimeLabel)], image_width: f32) -> Option<(f32, f32)> {
    if labels.is_empty() {
        return None;
    }

    let start = labels
        .iter()
        .map(|(fragment, _)| fragment.x)
        .fold(f32::INFINITY, f32::min);
    let end = labels
        .iter()
        .map(|(fragment, _)| fragment.right())
        .fold(f32::NEG_INFINITY, f32::max);

    Some((
        (start - TIME_COLUMN_LEFT_PADDING).max(0.0),
        (end + TIME_COLUMN_RIGHT_PADDING).min(image_width),
    ))
}

fn header_doctors<'a>(page: &'a PreparedPage, options: &ExtractOptions) -> Vec<&'a TextFragment> {
    let mut doctors = header_band(page, options)
        .filter(|fragment| is_doctor_token(&fragment.text))
        .collect::<Vec<_>>();
    doctors.sort_by(|left, right| left.x.total_cmp(&right.x));
    doctors.dedup_by(|right, left| (right.x - left.x).abs() < DUPLICATE_HEADER_DISTANCE);
    doctors
}

fn clinician_name(
    doctor: &TextFragment,
    next_x: Option<f32>,
    page: &PreparedPage,
    options: &ExtractOptions,
) -> Option<String> {
    let reach = doctor.x + options.clinician_reach;

    let mut words = header_band(page, options)
        .filter(|fragment| (fragment.y - doctor.y).abs() <= CLINICIAN_ROW_TOLERANCE)
        .filter(|fragment| fragment.x >= doctor.x && fragment.x <= reach)
        .filter(|fragment| next_x.is_none_or(|next_x| fragment.x < next_x))
        .collect::<Vec<_>>();
    words.sort_by(|left, right| left.x.total_cmp(&right.x));

    let name = words
        .iter()
        .map(|fragment| fragment.text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!name.is_empty()).then_some(name)
}

fn has_percent_span(column: &DetectedColumn) -> bool {
    column.x_start_percent < column.x_end_percent
}

pub(crate) fn detect_calendar_columns(
    page: &PreparedPage,
    options: &ExtractOptions,
    warnings: &mut Vec<ExtractWarning>,
) -> ColumnLayout {
    let width = page.size.width;
    let labels = time_label_fragments(page, options);
    let hull = time_hull(&labels, width);
    let doctors = header_doctors(page, options);

    let content_start = match (hull, doctors.first()) {
        (Some((_, edge)), Some(first)) => edge.min(first.x),
        (Some((_, edge)), None) => edge,
        (None, _) => 0.0,
    };

    let mut columns = Vec::with_capacity(doctors.len() + 1);
    if labels.len() >= TIME_COLUMN_MIN_LABELS {
        if let Some((start, _)) = hull {
            let time = DetectedColumn::time_column(start, content_start, width);
            if start < content_start && has_percent_span(&time) {
                columns.push(time);
            }
        }
    }

    if doctors.is_empty() {
        warnings.push(
            ExtractWarning::new(
                WarningCode::NoClinicianHeaders,
                "calendar layout without Dr headers; using one full-width column",
            )
            .with_column("column-1"),
        );
        let column = DetectedColumn::new("column-1", None, content_start, width, width);
        if content_start < width && has_percent_span(&column) {
            columns.push(column);
        }
    } else {
        // A column too narrow to span a whole percent is folded into its right neighbour.
        let mut carried_start = None;
        for (index, doctor) in doctors.iter().enumerate() {
            let previous = index.checked_sub(1).map(|previous| doctors[previous]);
            let next = doctors.get(index + 1);

            let x_start = carried_start.take().unwrap_or_else(|| {
                previous.map_or(content_start, |previous| (previous.x + doctor.x) / 2.0)
            });
            let x_end = next.map_or(width, |next| (doctor.x + next.x) / 2.0);
            if x_end <= x_start {
                continue;
            }

            let column = DetectedColumn::new(
                format!("column-{}", index + 1),
                clinician_name(doctor, next.map(|next| next.x), page, options),
                x_start,
                x_end,
                width,
            );
            if has_percent_span(&column) {
                columns.push(column);
            } else {
                carried_start = Some(x_start);
            }
        }

        if carried_start.is_some() {
            if let Some(last) = columns.last_mut().filter(|column| !column.is_time_column) {
                *last = DetectedColumn::new(
                    last.id.clone(),
                    last.clinician_name.clone(),
                    last.x_start,
                    width,
                    width,
                );
            }
        }
    }

    tracing::debug!(
        columns = columns.len(),
        time_labels = labels.len(),
        "detected calendar columns"
    );

    ColumnLayout {
        layout: Layout::Calendar,
        columns,
        time_labels: labels.into_iter().map(|(_, label)| label).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::{detect_calendar_columns, detect_time_labels, edited_time_labels};
    use crate::model::{DetectedColumn, ImageSize, PreparedPage, TextFragment};
    use crate::options::ExtractOptions;
    use crate::warning::WarningCode;

    fn page(fragments: Vec<TextFragment>) -> PreparedPage {
        PreparedPage {
            fragments,
            size: ImageSize {
                width: 1200.0,
                height: 1000.0,
            },
        }
    }

    fn two_doctor_header() -> Vec<TextFragment> {
        vec![
            TextFragment::new("Dr", 500.0, 50.0, 20.0, 14.0),
            TextFragment::new("Smith", 530.0, 52.0, 50.0, 14.0),
            TextFragment::new("Dr", 900.0, 50.0, 20.0, 14.0),
            TextFragment::new("Jones", 930.0, 50.0, 50.0, 14.0),
        ]
    }

    #[test]
    fn columns_split_halfway_between_headers() {
        let mut fragments = two_doctor_header();
        fragments.push(TextFragment::new("9am", 40.0, 200.0, 40.0, 14.0));
        fragments.push(TextFragment::new("10am", 40.0, 300.0, 45.0, 14.0));

        let mut warnings = Vec::new();
        let detected =
            detect_calendar_columns(&page(fragments), &ExtractOptions::default(), &mut warnings);
        assert!(warnings.is_empty());
        assert_eq!(detected.columns.len(), 3);

        let time = &detected.columns[0];
        assert!(time.is_time_column);
        assert_eq!(time.x_start, 30.0);
        assert_eq!(time.x_end, 105.0);

        let smith = &detected.columns[1];
        assert_eq!(smith.clinician_name.as_deref(), Some("Dr Smith"));
        assert_eq!(smith.x_start, 105.0);
        assert_eq!(smith.x_end, 700.0);

        let jones = &detected.columns[2];
        assert_eq!(jones.clinician_name.as_deref(), Some("Dr Jones"));
        assert_eq!(jones.x_start, 700.0);
        assert_eq!(jones.x_end, 1200.0);
        assert_eq!(jones.x_start_percent, 58.0);
        assert_eq!(jones.x_end_percent, 100.0);

        assert_eq!(detected.time_labels.len(), 2);
        assert_eq!(detected.time_labels[1].time, "10:00");
    }

    #[test]
    fn single_label_is_not_a_time_column_but_still_a_label() {
        let mut fragments = two_doctor_header();
        fragments.push(TextFragment::new("9am", 40.0, 200.0, 40.0, 14.0));

        let detected = detect_calendar_columns(
            &page(fragments),
            &ExtractOptions::default(),
            &mut Vec::new(),
        );
        assert!(detected.columns.iter().all(|column| !column.is_time_column));
        assert_eq!(detected.columns[0].x_start, 100.0);
        assert_eq!(detected.time_labels.len(), 1);
    }

    fn assert_ordered_columns(columns: &[DetectedColumn]) {
        for column in columns {
            assert!(column.x_start < column.x_end, "column: {column:?}");
            assert!(column.x_start_percent >= 0.0, "column: {column:?}");
            assert!(
                column.x_start_percent < column.x_end_percent,
                "column: {column:?}"
            );
            assert!(column.x_end_percent <= 100.0, "column: {column:?}");
        }
        for pair in columns.windows(2) {
            assert!(pair[0].x_end <= pair[1].x_start);
            assert!(pair[0].x_end_percent <= pair[1].x_start_percent);
        }
    }

    #[test]
    fn columns_never_overlap() {
        let fragments = vec![
            TextFragment::new("Dr", 300.0, 40.0, 20.0, 14.0),
            TextFragment::new("Dr", 600.0, 40.0, 20.0, 14.0),
            TextFragment::new("Dr", 610.0, 40.0, 20.0, 14.0),
            TextFragment::new("Dr", 1000.0, 40.0, 20.0, 14.0),
        ];
        let detected = detect_calendar_columns(
            &page(fragments),
            &ExtractOptions::default(),
            &mut Vec::new(),
        );
        assert_ordered_columns(&detected.columns);

        let crowded = PreparedPage {
            fragments: vec![
                TextFragment::new("Dr", 996.0, 40.0, 20.0, 14.0),
                TextFragment::new("Dr", 1006.0, 40.0, 20.0, 14.0),
                TextFragment::new("Dr", 1012.0, 40.0, 20.0, 14.0),
            ],
            size: ImageSize {
                width: 2000.0,
                height: 1000.0,
            },
        };
        let detected =
            detect_calendar_columns(&crowded, &ExtractOptions::default(), &mut Vec::new());
        assert_ordered_columns(&detected.columns);
        let ids = detected
            .columns
            .iter()
            .map(|column| column.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["column-1", "column-3"]);
        assert_eq!(detected.columns[1].x_start, 1001.0);
        assert_eq!(detected.columns[1].x_end, 2000.0);
    }

    #[test]
    fn missing_headers_fail_open_to_one_column() {
        let mut warnings = Vec::new();
        let detected = detect_calendar_columns(
            &page(vec![TextFragment::new("SMITH", 500.0, 300.0, 50.0, 14.0)]),
            &ExtractOptions::default(),
            &mut warnings,
        );
        assert_eq!(detected.columns.len(), 1);
        assert_eq!(detected.columns[0].x_start, 0.0);
        assert_eq!(detected.columns[0].x_end, 1200.0);
        assert_eq!(warnings[0].code, WarningCode::NoClinicianHeaders);
        assert_eq!(warnings[0].column.as_deref(), Some("column-1"));
    }

    #[test]
    fn header_clock_is_not_a_time_label() {
        let fragments = vec![
            TextFragment::new("9:41", 20.0, 5.0, 40.0, 14.0),
            TextFragment::new("2pm", 20.0, 400.0, 40.0, 14.0),
            TextFragment::new("3pm", 800.0, 500.0, 40.0, 14.0),
        ];
        let labels = detect_time_labels(&page(fragments), &ExtractOptions::default());
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].time, "14:00");
    }

    #[test]
    fn edited_time_column_supplies_labels_outside_the_left_region() {
        let fragments = vec![
            TextFragment::new("9am", 420.0, 200.0, 40.0, 14.0),
            TextFragment::new("10am", 420.0, 400.0, 40.0, 14.0),
            TextFragment::new("2pm", 40.0, 600.0, 40.0, 14.0),
        ];
        let columns = vec![
            DetectedColumn::time_column(400.0, 480.0, 1200.0),
            DetectedColumn::new("column-1", None, 480.0, 1200.0, 1200.0),
        ];
        let page = page(fragments);
        let options = ExtractOptions::default();

        let labels = edited_time_labels(&page, &options, &columns);
        let times = labels
            .iter()
            .map(|label| label.time.as_str())
            .collect::<Vec<_>>();
        assert_eq!(times, vec!["09:00", "10:00"]);

        let fallback = edited_time_labels(&page, &options, &columns[1..]);
        assert_eq!(fallback.len(), 1);
        assert_eq!(fallback[0].time, "14:00");
    }
}
