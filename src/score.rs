use std::sync::LazyLock;

use regex::Regex;

use crate::model::ParsedAppointment;

static CANONICAL_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").expect("hardcoded HH:MM regex is valid")
});
static CANONICAL_PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^0[2-478]\d{2} \d{3} \d{3}$").expect("hardcoded canonical phone regex is valid")
});

const TIME_WEIGHT: f32 = 1.0;
const NAME_WEIGHT: f32 = 1.0;
const PHONE_WEIGHT: f32 = 1.0;
const TYPE_WEIGHT: f32 = 0.5;
const MIN_NAME_CHARS: usize = 3;

// Every factor counts towards the denominator; a recovered field never lowers the score.
pub(crate) fn confidence(appointment: &ParsedAppointment) -> f32 {
    let factors = [
        (
            TIME_WEIGHT,
            appointment
                .appointment_time
                .as_deref()
                .is_some_and(|time| CANONICAL_TIME_RE.is_match(time)),
        ),
        (
            NAME_WEIGHT,
            appointment
                .patient_name
                .as_deref()
                .is_some_and(|name| name.chars().count() >= MIN_NAME_CHARS),
        ),
        (
            PHONE_WEIGHT,
            appointment
                .patient_phone
                .as_deref()
                .is_some_and(|phone| CANONICAL_PHONE_RE.is_match(phone)),
        ),
        (TYPE_WEIGHT, appointment.appointment_type.is_some()),
    ];

    let total = factors.iter().map(|(weight, _)| weight).sum::<f32>();
    let score = factors
        .iter()
        .filter(|(_, satisfied)| *satisfied)
        .map(|(weight, _)| weight)
        .sum::<f32>();

    (score / total * 100.0).round() / 100.0
}

pub(crate) fn with_confidence(appointment: ParsedAppointment) -> ParsedAppointment {
    ParsedAppointment {
        confidence: confidence(&appointment),
        ..appointment
    }
}
