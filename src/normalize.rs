use chrono::NaiveTime;

use crate::model::ParsedAppointment;

fn capitalize(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut at_start = true;
    for ch in word.chars() {
        if at_start {
            out.extend(ch.to_uppercase());
        } else {
            out.extend(ch.to_lowercase());
        }
        at_start = matches!(ch, '-' | '\'');
    }
    out
}

pub(crate) fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_twelve_hour(stem: &str, pm: bool) -> Option<(u32, u32)> {
    let (hour, minute) = if let Some((hour, minute)) = stem.split_once(':') {
        (hour, if minute.is_empty() { "0" } else { minute })
    } else if stem.len() <= 2 {
        (stem, "0")
    } else {
        stem.split_at(stem.len() - 2)
    };

    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    if !(1..=12).contains(&hour) || minute > 59 {
        return None;
    }

    let hour = match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (hour, true) => hour + 12,
        (hour, false) => hour,
    };
    Some((hour, minute))
}

fn parse_twenty_four_hour(text: &str) -> Option<(u32, u32)> {
    let (hour, minute) = text.split_once(':')?;
    if minute.len() != 2 {
        return None;
    }
    Some((hour.parse().ok()?, minute.parse().ok()?))
}

pub(crate) fn normalize_time(raw: &str) -> Option<String> {
    let compact = raw
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();

    let (hour, minute) = if let Some(stem) = compact.strip_suffix("am") {
        parse_twelve_hour(stem, false)?
    } else if let Some(stem) = compact.strip_suffix("pm") {
        parse_twelve_hour(stem, true)?
    } else {
        parse_twenty_four_hour(&compact)?
    };

    NaiveTime::from_hms_opt(hour, minute, 0).map(|time| time.format("%H:%M").to_string())
}

pub(crate) fn normalize_phone(raw: &str) -> String {
    let digits = raw
        .chars()
        .filter(char::is_ascii_digit)
        .collect::<String>();
    if digits.len() != 10 {
        return raw.trim().to_string();
    }
    format!("{} {} {}", &digits[..4], &digits[4..7], &digits[7..])
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

pub(crate) fn normalize_appointment(raw: ParsedAppointment) -> ParsedAppointment {
    ParsedAppointment {
        patient_name: non_empty(raw.patient_name.as_deref().map(title_case)),
        patient_phone: non_empty(raw.patient_phone.as_deref().map(normalize_phone)),
        appointment_time: non_empty(
            raw.appointment_time
                .as_deref()
                .map(|time| normalize_time(time).unwrap_or_else(|| time.trim().to_string())),
        ),
        appointment_type: non_empty(raw.appointment_type.map(|kind| kind.trim().to_string())),
        clinician_name: non_empty(raw.clinician_name.map(|name| name.trim().to_string())),
        confidence: raw.confidence,
    }
}
