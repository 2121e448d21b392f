use chrono::Utc;
use chrono_tz::Tz;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set, TransactionTrait};

use crate::entity::{faults, raw_strings, readings, sensors};
use crate::error::{AppError, AppResult};

use super::decode::{classify, Decoded};
use super::grammar::tokenize;

/// Longest raw string accepted for storage.
pub const MAX_PAYLOAD_LEN: usize = 200;

/// A stored raw string together with the row decoded from it.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub raw_string: raw_strings::Model,
    pub outcome: Outcome,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Reading(readings::Model),
    Fault(faults::Model),
}

impl Outcome {
    #[must_use]
    pub fn sensor_id(&self) -> &str {
        match self {
            Self::Reading(r) => &r.sensor_id,
            Self::Fault(f) => &f.sensor_id,
        }
    }
}

/// Reject payloads that could never be stored.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for blank or oversized payloads.
pub fn validate_payload(payload: &str) -> AppResult<()> {
    if payload.trim().is_empty() {
        return Err(AppError::BadRequest("stringa must not be blank".to_string()));
    }
    if payload.chars().count() > MAX_PAYLOAD_LEN {
        return Err(AppError::BadRequest(format!(
            "stringa must be at most {MAX_PAYLOAD_LEN} characters"
        )));
    }
    Ok(())
}

/// Decode a raw string and persist it with its reading or fault.
///
/// The raw string and the derived row are written in one transaction: if the
/// sensor is unknown or the payload is malformed nothing is stored.
///
/// # Errors
///
/// - `AppError::BadRequest` if the payload fails [`validate_payload`]
/// - `AppError::MalformedPayload` if the payload does not follow the grammar
///   or its reading part cannot be decoded
/// - `AppError::UnknownSensor` if the sensor id is not registered
/// - `AppError::Database` on storage failure
pub async fn ingest<C>(db: &C, tz: Tz, payload: &str) -> AppResult<Ingested>
where
    C: ConnectionTrait + TransactionTrait,
{
    validate_payload(payload)?;
    let frame = tokenize(payload)?;

    let txn = db.begin().await?;

    let sensor = sensors::Entity::find_by_id(frame.sensor_id.to_string())
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::UnknownSensor(frame.sensor_id.to_string()))?;

    let decoded = classify(&frame, &sensor.fault_code, tz)?;

    let raw_string = raw_strings::ActiveModel {
        payload: Set(payload.to_string()),
        received_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let outcome = match decoded {
        Decoded::Reading(reading) => {
            let row = readings::ActiveModel {
                raw_string_id: Set(raw_string.id),
                sensor_id: Set(sensor.id.clone()),
                recorded_at: Set(reading.recorded_at.with_timezone(&Utc).fixed_offset()),
                value: Set(reading.value),
                message: Set(Some(reading.message)),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            Outcome::Reading(row)
        }
        Decoded::Fault(fault) => {
            let row = faults::ActiveModel {
                raw_string_id: Set(raw_string.id),
                sensor_id: Set(sensor.id.clone()),
                message: Set(Some(fault.message)),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            Outcome::Fault(row)
        }
    };

    txn.commit().await?;

    match &outcome {
        Outcome::Reading(r) => tracing::debug!(
            sensor_id = %r.sensor_id,
            raw_string_id = raw_string.id,
            value = r.value,
            recorded_at = %r.recorded_at,
            "Reading decoded"
        ),
        Outcome::Fault(f) => tracing::debug!(
            sensor_id = %f.sensor_id,
            raw_string_id = raw_string.id,
            "Fault decoded"
        ),
    }

    Ok(Ingested {
        raw_string,
        outcome,
    })
}

/// A raw string that was skipped during a batch import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLine {
    /// 1-based position in the batch
    pub line: usize,
    pub payload: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub accepted: usize,
    pub rejected: Vec<RejectedLine>,
}

/// Ingest many raw strings, each in its own transaction.
///
/// Payload problems reject the line and the import continues. Storage errors
/// abort the import; lines accepted before the failure stay committed.
///
/// # Errors
///
/// Returns `AppError::Database` if storage fails.
pub async fn ingest_batch<C, I, S>(db: &C, tz: Tz, payloads: I) -> AppResult<BatchReport>
where
    C: ConnectionTrait + TransactionTrait,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut report = BatchReport::default();

    for (index, payload) in payloads.into_iter().enumerate() {
        let payload = payload.as_ref();
        match ingest(db, tz, payload).await {
            Ok(_) => report.accepted += 1,
            Err(e @ (AppError::BadRequest(_)
            | AppError::MalformedPayload(_)
            | AppError::UnknownSensor(_))) => {
                tracing::warn!(line = index + 1, error = %e, "Rejected raw string");
                report.rejected.push(RejectedLine {
                    line: index + 1,
                    payload: payload.to_string(),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    tracing::info!(
        accepted = report.accepted,
        rejected = report.rejected.len(),
        "Batch import finished"
    );

    Ok(report)
}

/// Read raw strings from CSV with a `stringa` header column.
///
/// Blank cells are skipped.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the CSV is malformed or the column is missing.
pub fn read_csv_payloads(data: &[u8]) -> AppResult<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(data);

    let column = reader
        .headers()
        .map_err(|e| AppError::BadRequest(format!("Invalid CSV: {e}")))?
        .iter()
        .position(|h| h == "stringa")
        .ok_or_else(|| AppError::BadRequest("CSV must have a 'stringa' column".to_string()))?;

    let mut payloads = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| AppError::BadRequest(format!("Invalid CSV: {e}")))?;
        if let Some(payload) = record.get(column)
            && !payload.trim().is_empty()
        {
            payloads.push(payload.to_string());
        }
    }

    Ok(payloads)
}
