use crate::calendar::{LabelSource, parse_calendar};
use crate::column_detect::{detect_calendar_columns, detect_time_labels, edited_time_labels};
use crate::layout::classify_layout;
use crate::model::{ColumnLayout, Layout, ParsedAppointment, PreparedPage};
use crate::options::{ExtractOptions, LayoutMode};
use crate::tabular::parse_tabular;
use crate::warning::ExtractWarning;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AppointmentParser {
    Calendar(ColumnLayout),
    Tabular,
}

impl AppointmentParser {
    pub(crate) fn select(
        page: &PreparedPage,
        options: &ExtractOptions,
        warnings: &mut Vec<ExtractWarning>,
    ) -> Self {
        if !options.columns.is_empty() {
            return Self::Calendar(ColumnLayout {
                layout: Layout::Calendar,
                columns: options.columns.clone(),
                time_labels: edited_time_labels(page, options, &options.columns),
            });
        }

        let layout = match options.layout_mode {
            LayoutMode::AutoDetect => classify_layout(page, options),
            LayoutMode::Calendar => Layout::Calendar,
            LayoutMode::Tabular => Layout::Tabular,
        };

        match layout {
            Layout::Calendar => Self::Calendar(detect_calendar_columns(page, options, warnings)),
            Layout::Tabular => Self::Tabular,
        }
    }

    pub(crate) fn layout(&self) -> Layout {
        match self {
            Self::Calendar(_) => Layout::Calendar,
            Self::Tabular => Layout::Tabular,
        }
    }

    pub(crate) fn column_layout(&self, page: &PreparedPage, options: &ExtractOptions) -> ColumnLayout {
        match self {
            Self::Calendar(detected) => detected.clone(),
            Self::Tabular => ColumnLayout {
                layout: Layout::Tabular,
                columns: Vec::new(),
                time_labels: detect_time_labels(page, options),
            },
        }
    }

    pub(crate) fn parse(
        &self,
        page: &PreparedPage,
        options: &ExtractOptions,
        warnings: &mut Vec<ExtractWarning>,
    ) -> Vec<ParsedAppointment> {
        match self {
            Self::Calendar(detected) => {
                if options.time_labels.is_empty() {
                    parse_calendar(
                        page,
                        &detected.columns,
                        &detected.time_labels,
                        LabelSource::Local,
                        options,
                    )
                } else {
                    let labels = options
                        .time_labels
                        .iter()
                        .map(|label| label.to_local(page.size.height))
                        .collect::<Vec<_>>();
                    parse_calendar(
                        page,
                        &detected.columns,
                        &labels,
                        LabelSource::External,
                        options,
                    )
                }
            }
            Self::Tabular => parse_tabular(page, options, warnings),
        }
    }
}
