use crate::cluster::cluster_fragments;
use crate::fields::extract_fields;
use crate::model::{DetectedColumn, ParsedAppointment, PreparedPage, TimeLabel};
use crate::options::ExtractOptions;
use crate::time_resolve::{TimeReference, resolve_time};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LabelSource {
    Local,
    External,
}

fn max_time_distance(
    columns: &[DetectedColumn],
    source: LabelSource,
    options: &ExtractOptions,
) -> f32 {
    let clinician_columns = columns
        .iter()
        .filter(|column| !column.is_time_column)
        .count();
    if source == LabelSource::External || clinician_columns > 1 {
        options.shared_time_distance
    } else {
        options.isolated_time_distance
    }
}

fn parse_column(
    page: &PreparedPage,
    column: &DetectedColumn,
    reference: TimeReference<'_>,
    options: &ExtractOptions,
) -> Vec<ParsedAppointment> {
    let header_limit = page.header_band_limit(options.header_band_fraction);
    let fragments = page
        .fragments
        .iter()
        .filter(|fragment| fragment.y >= header_limit && column.contains(fragment));
    let clusters = cluster_fragments(fragments, options.cluster_tolerance, options.line_tolerance);

    let appointments = clusters
        .iter()
        .filter_map(|cluster| {
            let time = resolve_time(&cluster.text(), cluster.min_y(), reference);
            extract_fields(&cluster.rows, options.line_tolerance)
                .into_appointment(time, column.clinician_name.clone())
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        column = %column.id,
        clusters = clusters.len(),
        appointments = appointments.len(),
        "parsed calendar column"
    );
    appointments
}

pub(crate) fn parse_calendar(
    page: &PreparedPage,
    columns: &[DetectedColumn],
    labels: &[TimeLabel],
    source: LabelSource,
    options: &ExtractOptions,
) -> Vec<ParsedAppointment> {
    let reference = TimeReference {
        labels,
        max_distance: max_time_distance(columns, source, options),
    };

    let mut ordered = columns
        .iter()
        .filter(|column| !column.is_time_column)
        .collect::<Vec<_>>();
    ordered.sort_by(|left, right| left.x_start.total_cmp(&right.x_start));

    ordered
        .into_iter()
        .flat_map(|column| parse_column(page, column, reference, options))
        .collect()
}
