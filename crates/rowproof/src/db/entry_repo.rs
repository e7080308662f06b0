//! Training entry repository.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{format_timestamp, now_timestamp, status_column, timestamp_column, Database, DatabaseError};
use crate::reconcile::ManualEntry;
use crate::status::ValidationStatus;

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingEntry {
    pub id: String,
    pub proof_image_id: Option<String>,
    pub date: DateTime<Utc>,
    pub minutes: u32,
    pub distance_km: f64,
    pub avg_hr: Option<u32>,
    pub validation_status: ValidationStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl TrainingEntry {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            proof_image_id: row.get("proof_image_id")?,
            date: timestamp_column(row, "date")?,
            minutes: row.get("minutes")?,
            distance_km: row.get("distance_km")?,
            avg_hr: row.get("avg_hr")?,
            validation_status: status_column(row, "validation_status")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// The athlete-entered values used for reconciliation.
    pub fn manual_entry(&self) -> ManualEntry {
        ManualEntry {
            date: self.date,
            minutes: self.minutes,
            distance_km: self.distance_km,
            avg_hr: self.avg_hr,
        }
    }
}

/// Values for a new entry as logged by the athlete.
#[derive(Debug, Clone)]
pub struct NewTrainingEntry {
    pub proof_image_id: Option<String>,
    pub date: DateTime<Utc>,
    pub minutes: u32,
    pub distance_km: f64,
    pub avg_hr: Option<u32>,
}

pub fn insert(db: &Database, entry: &NewTrainingEntry) -> Result<TrainingEntry, DatabaseError> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = now_timestamp();
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO training_entries (id, proof_image_id, date, minutes, distance_km, avg_hr,
             validation_status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'NOT_CHECKED', ?7, ?7)",
            params![
                id,
                entry.proof_image_id,
                format_timestamp(entry.date),
                entry.minutes,
                entry.distance_km,
                entry.avg_hr,
                now,
            ],
        )?;
        Ok(())
    })?;

    find_by_id(db, &id)?.ok_or(DatabaseError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
}

pub fn find_by_id(db: &Database, id: &str) -> Result<Option<TrainingEntry>, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn
            .query_row(
                "SELECT * FROM training_entries WHERE id = ?1",
                params![id],
                TrainingEntry::from_row,
            )
            .optional()?)
    })
}

pub fn find_by_proof_image_id(
    db: &Database,
    proof_image_id: &str,
) -> Result<Option<TrainingEntry>, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn
            .query_row(
                "SELECT * FROM training_entries WHERE proof_image_id = ?1",
                params![proof_image_id],
                TrainingEntry::from_row,
            )
            .optional()?)
    })
}

/// Propagates a validation status onto the entry unless a reviewer already decided it.
pub fn update_validation_status_if_pending(
    db: &Database,
    id: &str,
    status: ValidationStatus,
) -> Result<bool, DatabaseError> {
    let now = now_timestamp();
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE training_entries SET validation_status = ?2, updated_at = ?3
             WHERE id = ?1 AND validation_status IN ('NOT_CHECKED', 'PENDING', 'EXTRACTION_INCOMPLETE')",
            params![id, status.as_str(), now],
        )?;
        Ok(changed > 0)
    })
}
