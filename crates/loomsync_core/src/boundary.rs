//! Boundary mapping between remote rows and typed entities.
//!
//! The remote store speaks loosely-typed JSON rows. Everything the engine
//! receives from it passes through this module exactly once; from here on
//! only typed [`Record`] and [`Settings`] values circulate. A malformed
//! row is rejected with a [`CoreError`] naming the offending field.

use crate::error::{CoreError, CoreResult};
use crate::id::RecordId;
use crate::record::{Record, Shift};
use crate::settings::Settings;
use crate::span::RunSpan;
use chrono::NaiveDate;
use serde_json::{Map, Number, Value};

/// A raw remote row: a JSON object as delivered by the remote store.
pub type RemoteRow = Map<String, Value>;

fn text<'a>(row: &'a RemoteRow, field: &str) -> CoreResult<&'a str> {
    row.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| CoreError::invalid_row(format!("missing or non-string field `{field}`")))
}

fn uint(row: &RemoteRow, field: &str) -> CoreResult<u64> {
    row.get(field)
        .and_then(Value::as_u64)
        .ok_or_else(|| {
            CoreError::invalid_row(format!("missing or non-integer field `{field}`"))
        })
}

fn float(row: &RemoteRow, field: &str) -> CoreResult<f64> {
    row.get(field)
        .and_then(Value::as_f64)
        .ok_or_else(|| CoreError::invalid_row(format!("missing or non-numeric field `{field}`")))
}

/// Extracts the record id of a row without mapping the rest.
///
/// Used for delete events, which carry only the deleted row's id.
///
/// # Errors
///
/// Returns an error when the `id` field is absent or not a UUID string.
pub fn id_from_row(row: &RemoteRow) -> CoreResult<RecordId> {
    RecordId::parse(text(row, "id")?)
}

/// Maps a remote row to a [`Record`], validating every field.
///
/// # Errors
///
/// Returns an error naming the first missing, mistyped, or out-of-range
/// field.
pub fn record_from_row(row: &RemoteRow) -> CoreResult<Record> {
    let id = id_from_row(row)?;

    let date_text = text(row, "date")?;
    let date = NaiveDate::parse_from_str(date_text, "%Y-%m-%d").map_err(|_| {
        CoreError::InvalidDate {
            value: date_text.into(),
        }
    })?;

    let shift: Shift = text(row, "shift")?.parse()?;
    let machine_no = text(row, "machineNo")?.to_string();

    let stops = u32::try_from(uint(row, "stops")?)
        .map_err(|_| CoreError::invalid_row("field `stops` out of range"))?;

    let weft_meter = float(row, "weftMeter")?;

    let total = RunSpan::parse(text(row, "total")?)?;
    let run = RunSpan::parse(text(row, "run")?)?;

    let record = Record {
        id,
        date,
        shift,
        machine_no,
        stops,
        weft_meter,
        total,
        run,
    };
    record.validate()?;
    Ok(record)
}

/// Maps a [`Record`] to the remote row shape.
#[must_use]
pub fn record_to_row(record: &Record) -> RemoteRow {
    let mut row = Map::new();
    row.insert("id".into(), Value::String(record.id.to_string()));
    row.insert(
        "date".into(),
        Value::String(record.date.format("%Y-%m-%d").to_string()),
    );
    row.insert("shift".into(), Value::String(record.shift.to_string()));
    row.insert("machineNo".into(), Value::String(record.machine_no.clone()));
    row.insert("stops".into(), Value::Number(record.stops.into()));
    row.insert(
        "weftMeter".into(),
        Number::from_f64(record.weft_meter)
            .map(Value::Number)
            .unwrap_or(Value::Null),
    );
    row.insert("total".into(), Value::String(record.total.to_string()));
    row.insert("run".into(), Value::String(record.run.to_string()));
    row
}

/// Maps a remote settings row to [`Settings`].
///
/// Absent fields keep their default value; present fields must carry the
/// right type.
///
/// # Errors
///
/// Returns an error when a present field has the wrong type or range.
pub fn settings_from_row(row: &RemoteRow) -> CoreResult<Settings> {
    let defaults = Settings::default();

    let machine_count = match row.get("machineCount") {
        None => defaults.machine_count,
        Some(v) => u32::try_from(v.as_u64().ok_or_else(|| {
            CoreError::invalid_row("non-integer field `machineCount`")
        })?)
        .map_err(|_| CoreError::invalid_row("field `machineCount` out of range"))?,
    };

    let alert_threshold = match row.get("alertThreshold") {
        None => defaults.alert_threshold,
        Some(v) => {
            let raw = v
                .as_u64()
                .ok_or_else(|| CoreError::invalid_row("non-integer field `alertThreshold`"))?;
            u8::try_from(raw.min(100))
                .map_err(|_| CoreError::invalid_row("field `alertThreshold` out of range"))?
        }
    };

    let opt_text = |field: &str| -> CoreResult<String> {
        match row.get(field) {
            None | Some(Value::Null) => Ok(String::new()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(CoreError::invalid_row(format!(
                "non-string field `{field}`"
            ))),
        }
    };

    Ok(Settings {
        machine_count,
        alert_threshold,
        remote_endpoint: opt_text("remoteEndpoint")?,
        remote_credential: opt_text("remoteCredential")?,
        message_template: opt_text("messageTemplate")?,
        message_recipient: opt_text("messageRecipient")?,
    })
}

/// Maps [`Settings`] to the remote row shape.
#[must_use]
pub fn settings_to_row(settings: &Settings) -> RemoteRow {
    let mut row = Map::new();
    row.insert(
        "machineCount".into(),
        Value::Number(settings.machine_count.into()),
    );
    row.insert(
        "alertThreshold".into(),
        Value::Number(settings.alert_threshold.into()),
    );
    row.insert(
        "remoteEndpoint".into(),
        Value::String(settings.remote_endpoint.clone()),
    );
    row.insert(
        "remoteCredential".into(),
        Value::String(settings.remote_credential.clone()),
    );
    row.insert(
        "messageTemplate".into(),
        Value::String(settings.message_template.clone()),
    );
    row.insert(
        "messageRecipient".into(),
        Value::String(settings.message_recipient.clone()),
    );
    row
}
