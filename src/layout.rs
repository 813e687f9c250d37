use crate::model::{Layout, PreparedPage, TextFragment};
use crate::options::ExtractOptions;

pub(crate) fn is_doctor_token(text: &str) -> bool {
    text.trim() == "Dr"
}

pub(crate) fn header_band<'a>(
    page: &'a PreparedPage,
    options: &ExtractOptions,
) -> impl Iterator<Item = &'a TextFragment> {
    let limit = page.header_band_limit(options.header_band_fraction);
    page.fragments
        .iter()
        .filter(move |fragment| fragment.y < limit)
}

pub(crate) fn classify_layout(page: &PreparedPage, options: &ExtractOptions) -> Layout {
    let doctors = header_band(page, options)
        .filter(|fragment| is_doctor_token(&fragment.text))
        .count();

    let layout = if doctors >= 2 {
        Layout::Calendar
    } else {
        Layout::Tabular
    };
    tracing::debug!(doctors, ?layout, "classified screenshot layout");
    layout
}

#[cfg(test)]
mod tests {
    use super::classify_layout;
    use crate::model::{ImageSize, Layout, PreparedPage, TextFragment};
    use crate::options::ExtractOptions;

    fn page(fragments: Vec<TextFragment>) -> PreparedPage {
        PreparedPage {
            fragments,
            size: ImageSize {
                width: 1200.0,
                height: 1000.0,
            },
        }
    }

    #[test]
    fn two_header_doctors_mean_calendar() {
        let page = page(vec![
            TextFragment::new("Dr", 500.0, 50.0, 20.0, 14.0),
            TextFragment::new("Dr", 900.0, 50.0, 20.0, 14.0),
        ]);
        assert_eq!(
            classify_layout(&page, &ExtractOptions::default()),
            Layout::Calendar
        );
    }

    #[test]
    fn single_doctor_or_body_doctors_mean_tabular() {
        let page = page(vec![
            TextFragment::new("Dr", 500.0, 50.0, 20.0, 14.0),
            TextFragment::new("Dr", 500.0, 400.0, 20.0, 14.0),
            TextFragment::new("Dr.", 900.0, 50.0, 20.0, 14.0),
        ]);
        assert_eq!(
            classify_layout(&page, &ExtractOptions::default()),
            Layout::Tabular
        );
    }
}
