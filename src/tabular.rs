use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use crate::cluster::group_rows;
use crate::fields::{extract_name, find_appointment_kind, find_phone};
use crate::layout::is_doctor_token;
use crate::model::{ParsedAppointment, PreparedPage, TextFragment};
use crate::options::ExtractOptions;
use crate::time_resolve::any_time;
use crate::warning::{ExtractWarning, WarningCode};

const HEADER_SEARCH_ROWS: usize = 4;
const HEADER_MIN_KEYWORDS: usize = 2;
const COLUMN_SLACK: f32 = 10.0;
const HEADER_CELL_GAP: f32 = 20.0;
const MODE_BUCKET: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TabularField {
    Name,
    Time,
    Clinician,
    Phone,
    Type,
}

fn keyword_field(word: &str) -> Option<TabularField> {
    match word {
        "patient" | "name" => Some(TabularField::Name),
        "time" => Some(TabularField::Time),
        "clinician" | "doctor" => Some(TabularField::Clinician),
        "ph" | "phone" => Some(TabularField::Phone),
        "appt" | "type" => Some(TabularField::Type),
        _ => None,
    }
}

fn is_qualifier(word: &str) -> bool {
    matches!(word, "patient" | "appt")
}

#[derive(Debug, Clone, PartialEq)]
struct HeaderToken {
    keyword: String,
    field: TabularField,
    x: f32,
    right: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct HeaderColumn {
    field: TabularField,
    x: f32,
}

fn header_tokens(row: &[&TextFragment]) -> Vec<HeaderToken> {
    row.iter()
        .flat_map(|fragment| {
            fragment.text.split_whitespace().filter_map(|word| {
                let keyword = word
                    .trim_matches(|ch: char| !ch.is_alphanumeric())
                    .to_lowercase();
                keyword_field(&keyword).map(|field| HeaderToken {
                    keyword,
                    field,
                    x: fragment.x,
                    right: fragment.right(),
                })
            })
        })
        .collect()
}

fn keyword_hits(tokens: &[HeaderToken]) -> usize {
    tokens
        .iter()
        .map(|token| token.keyword.as_str())
        .collect::<BTreeSet<_>>()
        .len()
}

fn header_columns(tokens: &[HeaderToken]) -> Vec<HeaderColumn> {
    let mut columns: Vec<HeaderColumn> = Vec::new();
    let mut previous: Option<&HeaderToken> = None;

    for token in tokens {
        let qualifies_previous = previous.is_some_and(|previous| {
            is_qualifier(&previous.keyword) && token.x - previous.right <= HEADER_CELL_GAP
        });

        previous = Some(token);
        if qualifies_previous {
            if let Some(last) = columns.last_mut() {
                last.field = token.field;
                continue;
            }
        }
        columns.push(HeaderColumn {
            field: token.field,
            x: token.x,
        });
    }

    columns.sort_by(|left, right| left.x.total_cmp(&right.x));
    columns
}

fn column_field(fragment: &TextFragment, columns: &[HeaderColumn]) -> Option<TabularField> {
    columns
        .iter()
        .rev()
        .find(|column| column.x <= fragment.x + COLUMN_SLACK)
        .or_else(|| columns.first())
        .map(|column| column.field)
}

fn fragments_text<'a, I>(fragments: I) -> String
where
    I: IntoIterator<Item = &'a TextFragment>,
{
    fragments
        .into_iter()
        .map(|fragment| fragment.text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_header_row(
    row: &[&TextFragment],
    columns: &[HeaderColumn],
    options: &ExtractOptions,
) -> Option<ParsedAppointment> {
    let cell = |field: TabularField| {
        row.iter()
            .copied()
            .filter(|fragment| column_field(fragment, columns) == Some(field))
            .collect::<Vec<_>>()
    };
    let row_text = fragments_text(row.iter().copied());

    let time_text = fragments_text(cell(TabularField::Time));
    let appointment_time = any_time(&time_text)
        .or_else(|| any_time(&row_text))
        .map(str::to_string)?;

    let type_text = fragments_text(cell(TabularField::Type));
    let kind = find_appointment_kind(&type_text).or_else(|| find_appointment_kind(&row_text));
    let appointment_type = kind
        .map(|kind| kind.label.to_string())
        .or_else(|| non_empty(type_text));

    let phone_text = fragments_text(cell(TabularField::Phone));
    let patient_phone = find_phone(&phone_text).or_else(|| find_phone(&row_text));

    let clinician_cell = cell(TabularField::Clinician);
    let patient_name = extract_name(cell(TabularField::Name), kind, options.line_tolerance)
        .or_else(|| {
            let rest = row
                .iter()
                .copied()
                .filter(|fragment| !clinician_cell.contains(fragment));
            extract_name(rest, kind, options.line_tolerance)
        });

    Some(ParsedAppointment {
        patient_name,
        patient_phone,
        appointment_time: Some(appointment_time),
        appointment_type,
        clinician_name: non_empty(fragments_text(clinician_cell)),
        confidence: 0.0,
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn time_column_x(rows: &[Vec<&TextFragment>]) -> Option<f32> {
    let mut counts = BTreeMap::new();
    for fragment in rows.iter().flatten() {
        if any_time(&fragment.text).is_some() {
            let bucket = (fragment.x / MODE_BUCKET).round() as i64;
            *counts.entry(bucket).or_insert(0_usize) += 1;
        }
    }

    counts
        .into_iter()
        .max_by_key(|(bucket, count)| (*count, Reverse(*bucket)))
        .map(|(bucket, _)| bucket as f32 * MODE_BUCKET)
}

fn inline_clinician<'a>(row: &[&'a TextFragment]) -> Vec<&'a TextFragment> {
    row.iter()
        .position(|fragment| is_doctor_token(&fragment.text))
        .map(|index| row.iter().skip(index).take(2).copied().collect())
        .unwrap_or_default()
}

fn parse_headerless_row(
    row: &[&TextFragment],
    time_x: Option<f32>,
    options: &ExtractOptions,
) -> Option<ParsedAppointment> {
    let row_text = fragments_text(row.iter().copied());
    let closest_time = time_x.and_then(|time_x| {
        row.iter()
            .filter(|fragment| any_time(&fragment.text).is_some())
            .min_by(|left, right| {
                (left.x - time_x)
                    .abs()
                    .total_cmp(&(right.x - time_x).abs())
            })
            .and_then(|fragment| any_time(&fragment.text))
    });
    let appointment_time = closest_time.or_else(|| any_time(&row_text))?.to_string();

    let kind = find_appointment_kind(&row_text);
    let clinician = inline_clinician(row);
    let patient_name = extract_name(
        row.iter()
            .copied()
            .filter(|fragment| !clinician.contains(fragment)),
        kind,
        options.line_tolerance,
    );

    Some(ParsedAppointment {
        patient_name,
        patient_phone: find_phone(&row_text),
        appointment_time: Some(appointment_time),
        appointment_type: kind.map(|kind| kind.label.to_string()),
        clinician_name: non_empty(fragments_text(clinician)),
        confidence: 0.0,
    })
}

pub(crate) fn parse_tabular(
    page: &PreparedPage,
    options: &ExtractOptions,
    warnings: &mut Vec<ExtractWarning>,
) -> Vec<ParsedAppointment> {
    let rows = group_rows(&page.fragments, options.line_tolerance);
    let header = rows
        .iter()
        .take(HEADER_SEARCH_ROWS)
        .enumerate()
        .map(|(index, row)| (index, header_tokens(row)))
        .find(|(_, tokens)| keyword_hits(tokens) >= HEADER_MIN_KEYWORDS);

    let appointments = if let Some((header_index, tokens)) = header {
        let columns = header_columns(&tokens);
        tracing::debug!(
            header_row = header_index,
            columns = columns.len(),
            "found tabular header row"
        );
        rows.iter()
            .skip(header_index + 1)
            .filter_map(|row| parse_header_row(row, &columns, options))
            .collect::<Vec<_>>()
    } else {
        if !rows.is_empty() {
            warnings.push(ExtractWarning::new(
                WarningCode::NoHeaderRow,
                "no header row found; locating the time column from time token positions",
            ));
        }
        let time_x = time_column_x(&rows);
        tracing::debug!(?time_x, "inferred tabular time column");
        rows.iter()
            .filter_map(|row| parse_headerless_row(row, time_x, options))
            .collect::<Vec<_>>()
    };

    tracing::debug!(
        rows = rows.len(),
        appointments = appointments.len(),
        "parsed tabular view"
    );
    appointments
}
