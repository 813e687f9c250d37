use crate::model::TextFragment;

// A fragment joins the open group while `y - group_start_y <= tolerance`.
pub(crate) fn group_by_y<'a, I>(fragments: I, tolerance: f32) -> Vec<Vec<&'a TextFragment>>
where
    I: IntoIterator<Item = &'a TextFragment>,
{
    let mut sorted = fragments.into_iter().collect::<Vec<_>>();
    sorted.sort_by(|left, right| left.y.total_cmp(&right.y).then(left.x.total_cmp(&right.x)));

    let mut groups: Vec<Vec<&TextFragment>> = Vec::new();
    let mut start_y = f32::NEG_INFINITY;
    for fragment in sorted {
        let continues = !groups.is_empty() && fragment.y - start_y <= tolerance;
        if continues {
            if let Some(group) = groups.last_mut() {
                group.push(fragment);
            }
        } else {
            start_y = fragment.y;
            groups.push(vec![fragment]);
        }
    }

    groups
}

pub(crate) fn group_rows<'a, I>(fragments: I, tolerance: f32) -> Vec<Vec<&'a TextFragment>>
where
    I: IntoIterator<Item = &'a TextFragment>,
{
    let mut rows = group_by_y(fragments, tolerance);
    for row in &mut rows {
        row.sort_by(|left, right| left.x.total_cmp(&right.x));
    }
    rows
}

pub(crate) fn rows_text(rows: &[Vec<&TextFragment>]) -> String {
    rows.iter()
        .flatten()
        .map(|fragment| fragment.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AppointmentCluster<'a> {
    pub rows: Vec<Vec<&'a TextFragment>>,
}

impl AppointmentCluster<'_> {
    pub(crate) fn min_y(&self) -> f32 {
        self.rows
            .iter()
            .flatten()
            .map(|fragment| fragment.y)
            .fold(f32::INFINITY, f32::min)
    }

    pub(crate) fn text(&self) -> String {
        rows_text(&self.rows)
    }
}

pub(crate) fn cluster_fragments<'a, I>(
    fragments: I,
    cluster_tolerance: f32,
    line_tolerance: f32,
) -> Vec<AppointmentCluster<'a>>
where
    I: IntoIterator<Item = &'a TextFragment>,
{
    group_by_y(fragments, cluster_tolerance)
        .into_iter()
        .map(|group| AppointmentCluster {
            rows: group_rows(group, line_tolerance),
        })
        .collect()
}
