use std::path::Path;

use csv::{Writer, WriterBuilder};

use crate::error::ExtractError;
use crate::model::ParsedAppointment;

const HEADERS: [&str; 7] = [
    "patient_name",
    "patient_phone",
    "appointment_time",
    "appointment_type",
    "clinician_name",
    "confidence",
    "needs_review",
];

fn record(appointment: &ParsedAppointment, review_threshold: f32) -> [String; 7] {
    let field = |value: &Option<String>| value.clone().unwrap_or_default();
    [
        field(&appointment.patient_name),
        field(&appointment.patient_phone),
        field(&appointment.appointment_time),
        field(&appointment.appointment_type),
        field(&appointment.clinician_name),
        format!("{:.2}", appointment.confidence),
        appointment.needs_review(review_threshold).to_string(),
    ]
}

fn write_records<W: std::io::Write>(
    writer: &mut Writer<W>,
    appointments: &[ParsedAppointment],
    review_threshold: f32,
) -> Result<(), ExtractError> {
    writer.write_record(HEADERS)?;
    for appointment in appointments {
        writer.write_record(record(appointment, review_threshold))?;
    }
    writer.flush()?;
    Ok(())
}

pub(crate) fn write_csv(
    path: &Path,
    appointments: &[ParsedAppointment],
    delimiter: u8,
    review_threshold: f32,
) -> Result<(), ExtractError> {
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_path(path)?;
    write_records(&mut writer, appointments, review_threshold)
}

pub(crate) fn write_csv_to_string(
    appointments: &[ParsedAppointment],
    delimiter: u8,
    review_threshold: f32,
) -> Result<String, ExtractError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::<u8>::new());
    write_records(&mut writer, appointments, review_threshold)?;

    let bytes = writer
        .into_inner()
        .map_err(|error| ExtractError::Csv(error.into_error().into()))?;
    String::from_utf8(bytes)
        .map_err(|error| ExtractError::InvalidOption(format!("invalid utf-8 csv output: {error}")))
}
