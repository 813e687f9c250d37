use std::sync::LazyLock;

use regex::Regex;

use crate::cluster::{group_rows, rows_text};
use crate::layout::is_doctor_token;
use crate::model::{ParsedAppointment, TextFragment};

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"0[2-478]\d{2}\s?\d{3}\s?\d{3}").expect("hardcoded AU phone regex is valid")
});
static CAPITALIZED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z][A-Za-z'\-]+$").expect("hardcoded capitalized word regex is valid")
});
static ALL_CAPS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2,}$").expect("hardcoded all-caps word regex is valid"));

const CHROME_TOKENS: &[&str] = &["Dr", "AM", "PM", "am", "pm"];
const CHECKBOX_GLYPHS: &[char] = &['☐', '☑', '☒', '✓', '✔', '✗', '✘', '□', '■'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AppointmentKind {
    pub phrase: &'static str,
    pub label: &'static str,
}

impl AppointmentKind {
    fn words(&self) -> impl Iterator<Item = &'static str> {
        self.phrase.split(' ')
    }
}

const APPOINTMENT_KINDS: &[AppointmentKind] = &[
    AppointmentKind {
        phrase: "pre operative",
        label: "Pre Operative",
    },
    AppointmentKind {
        phrase: "post operative",
        label: "Post Operative",
    },
    AppointmentKind {
        phrase: "pre op",
        label: "Pre Op",
    },
    AppointmentKind {
        phrase: "post op",
        label: "Post Op",
    },
    AppointmentKind {
        phrase: "new patient",
        label: "New Patient",
    },
    AppointmentKind {
        phrase: "initial consultation",
        label: "Initial Consultation",
    },
    AppointmentKind {
        phrase: "initial consult",
        label: "Initial Consult",
    },
    AppointmentKind {
        phrase: "follow up",
        label: "Follow Up",
    },
    AppointmentKind {
        phrase: "followup",
        label: "Follow Up",
    },
    AppointmentKind {
        phrase: "check up",
        label: "Check Up",
    },
    AppointmentKind {
        phrase: "checkup",
        label: "Check Up",
    },
    AppointmentKind {
        phrase: "telehealth",
        label: "Telehealth",
    },
    AppointmentKind {
        phrase: "procedure",
        label: "Procedure",
    },
    AppointmentKind {
        phrase: "consultation",
        label: "Consultation",
    },
    AppointmentKind {
        phrase: "consult",
        label: "Consult",
    },
    AppointmentKind {
        phrase: "injection",
        label: "Injection",
    },
    AppointmentKind {
        phrase: "dressing",
        label: "Dressing",
    },
    AppointmentKind {
        phrase: "review",
        label: "Review",
    },
];

fn trim_punctuation(word: &str) -> &str {
    word.trim_matches(|ch: char| matches!(ch, ',' | '.' | ';' | ':' | '(' | ')' | '"' | '*'))
}

fn match_words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|ch: char| ch.is_whitespace() || ch == '-')
        .map(trim_punctuation)
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn find_phone(text: &str) -> Option<String> {
    PHONE_RE.find(text).map(|found| found.as_str().to_string())
}

pub(crate) fn find_appointment_kind(text: &str) -> Option<AppointmentKind> {
    let haystack = format!(" {} ", match_words(text).join(" "));
    APPOINTMENT_KINDS
        .iter()
        .find(|kind| haystack.contains(&format!(" {} ", kind.phrase)))
        .copied()
}

fn is_type_word(word: &str, kind: Option<AppointmentKind>) -> bool {
    let Some(kind) = kind else {
        return false;
    };
    let lower = word.to_lowercase();
    lower
        .split('-')
        .all(|part| kind.words().any(|kind_word| kind_word == part))
}

fn is_chrome(word: &str) -> bool {
    is_doctor_token(word)
        || CHROME_TOKENS.contains(&word)
        || word.chars().any(|ch| CHECKBOX_GLYPHS.contains(&ch))
}

fn is_name_word(word: &str) -> bool {
    word.chars().count() >= 2 && (CAPITALIZED_RE.is_match(word) || ALL_CAPS_RE.is_match(word))
}

fn name_words(fragment: &TextFragment, kind: Option<AppointmentKind>) -> Vec<&str> {
    fragment
        .text
        .split_whitespace()
        .map(trim_punctuation)
        .filter(|word| !is_chrome(word) && !is_type_word(word, kind) && is_name_word(word))
        .collect()
}

pub(crate) fn extract_name<'a, I>(
    fragments: I,
    kind: Option<AppointmentKind>,
    line_tolerance: f32,
) -> Option<String>
where
    I: IntoIterator<Item = &'a TextFragment>,
{
    let candidates = fragments
        .into_iter()
        .filter(|fragment| !name_words(fragment, kind).is_empty())
        .collect::<Vec<_>>();

    group_rows(candidates, line_tolerance)
        .first()
        .map(|row| {
            row.iter()
                .flat_map(|fragment| name_words(fragment, kind))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|name| !name.is_empty())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ExtractedFields {
    pub patient_name: Option<String>,
    pub patient_phone: Option<String>,
    pub appointment_type: Option<String>,
}

impl ExtractedFields {
    pub(crate) fn into_appointment(
        self,
        appointment_time: Option<String>,
        clinician_name: Option<String>,
    ) -> Option<ParsedAppointment> {
        if self.patient_name.is_none() && appointment_time.is_none() {
            return None;
        }

        Some(ParsedAppointment {
            patient_name: self.patient_name,
            patient_phone: self.patient_phone,
            appointment_time,
            appointment_type: self.appointment_type,
            clinician_name,
            confidence: 0.0,
        })
    }
}

pub(crate) fn extract_fields(rows: &[Vec<&TextFragment>], line_tolerance: f32) -> ExtractedFields {
    let text = rows_text(rows);
    let kind = find_appointment_kind(&text);

    ExtractedFields {
        patient_name: extract_name(rows.iter().flatten().copied(), kind, line_tolerance),
        patient_phone: find_phone(&text),
        appointment_type: kind.map(|kind| kind.label.to_string()),
    }
}
