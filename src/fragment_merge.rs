use std::sync::LazyLock;

use regex::Regex;

use crate::cluster::group_rows;
use crate::model::TextFragment;
use crate::options::ExtractOptions;

static PHONE_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0[24]\d{2}$").expect("hardcoded phone prefix regex is valid"));
static PHONE_TRIPLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}$").expect("hardcoded digit triple regex is valid"));
static TIME_STEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}:?\d{0,2}$").expect("hardcoded time stem regex is valid"));
static MERIDIEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(am|pm)$").expect("hardcoded meridiem regex is valid"));

fn gap(left: &TextFragment, right: &TextFragment) -> f32 {
    right.x - left.right()
}

fn join_phone(rest: &[&TextFragment], max_gap: f32) -> Option<(TextFragment, usize)> {
    let (first, tail) = rest.split_first()?;
    if !PHONE_PREFIX_RE.is_match(&first.text) {
        return None;
    }

    let mut parts = vec![*first];
    for candidate in tail.iter().take(2) {
        let previous = parts[parts.len() - 1];
        if !PHONE_TRIPLE_RE.is_match(&candidate.text) || gap(previous, candidate) > max_gap {
            break;
        }
        parts.push(*candidate);
    }

    if parts.len() != 3 {
        return None;
    }

    let text = parts
        .iter()
        .map(|part| part.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    Some((TextFragment::hull(&parts, text), parts.len()))
}

fn join_meridiem(rest: &[&TextFragment], max_gap: f32) -> Option<(TextFragment, usize)> {
    let [stem, marker, ..] = rest else {
        return None;
    };
    if !TIME_STEM_RE.is_match(&stem.text)
        || !MERIDIEM_RE.is_match(&marker.text)
        || gap(stem, marker) > max_gap
    {
        return None;
    }

    let text = format!("{}{}", stem.text, marker.text);
    Some((TextFragment::hull(&[*stem, *marker], text), 2))
}

fn strip_leading_dash(fragment: &TextFragment) -> Option<TextFragment> {
    let Some(stripped) = fragment.text.strip_prefix('-') else {
        return Some(fragment.clone());
    };
    let stripped = stripped.trim();
    if stripped.is_empty() {
        return None;
    }

    Some(TextFragment {
        text: stripped.to_string(),
        ..fragment.clone()
    })
}

fn merge_line(line: &[&TextFragment], options: &ExtractOptions) -> Vec<TextFragment> {
    let mut merged = Vec::with_capacity(line.len());
    let mut index = 0;
    while index < line.len() {
        let rest = &line[index..];
        if let Some((fragment, consumed)) = join_phone(rest, options.phone_gap)
            .or_else(|| join_meridiem(rest, options.meridiem_gap))
        {
            merged.push(fragment);
            index += consumed;
            continue;
        }

        merged.extend(strip_leading_dash(line[index]));
        index += 1;
    }
    merged
}

pub(crate) fn merge_fragments(
    fragments: &[TextFragment],
    options: &ExtractOptions,
) -> Vec<TextFragment> {
    let merged = group_rows(fragments, options.line_tolerance)
        .iter()
        .flat_map(|line| merge_line(line, options))
        .collect::<Vec<_>>();

    tracing::debug!(
        input = fragments.len(),
        output = merged.len(),
        "merged OCR fragments"
    );
    merged
}
