//! Job repository: the extraction queue and its lease protocol.
//!
//! A job is owned by a worker while `status = 'PROCESSING'` and `locked_at`
//! is set. Ownership is only ever taken through a conditional UPDATE whose
//! WHERE clause re-checks the leasable state, so two workers racing for the
//! same row cannot both succeed.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

use super::{format_timestamp, now_timestamp, status_column, Database, DatabaseError};
use crate::sanitize::truncate_error;
use crate::status::ExtractionStatus;

/// A job row from the database.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionJob {
    pub id: String,
    pub proof_image_id: String,
    pub status: ExtractionStatus,
    pub attempts: u32,
    pub locked_at: Option<String>,
    pub last_error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ExtractionJob {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            proof_image_id: row.get("proof_image_id")?,
            status: status_column(row, "status")?,
            attempts: row.get("attempts")?,
            locked_at: row.get("locked_at")?,
            last_error: row.get("last_error")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// A job this worker currently holds the lease on.
#[derive(Debug, Clone, PartialEq)]
pub struct LeasedJob {
    pub id: String,
    pub proof_image_id: String,
    pub attempts: u32,
    pub locked_at: String,
}

// Shared by the candidate scan and the CAS so both agree on what is leasable.
// ?1 is the stale cutoff; NULL disables reclaiming PROCESSING rows.
const LEASABLE: &str = "((status = 'NOT_CHECKED' AND locked_at IS NULL)
     OR (?1 IS NOT NULL AND status = 'PROCESSING' AND locked_at IS NOT NULL AND locked_at < ?1))";

/// Creates a NOT_CHECKED job for the image. Returns the existing job if one is already queued.
pub fn enqueue(db: &Database, proof_image_id: &str) -> Result<ExtractionJob, DatabaseError> {
    let now = now_timestamp();
    let id = uuid::Uuid::new_v4().to_string();
    let inserted = db.with_conn(|conn| {
        Ok(conn.execute(
            "INSERT INTO proof_extraction_jobs (id, proof_image_id, status, attempts, created_at, updated_at)
             VALUES (?1, ?2, 'NOT_CHECKED', 0, ?3, ?3)
             ON CONFLICT(proof_image_id) DO NOTHING",
            params![id, proof_image_id, now],
        )?)
    })?;

    if inserted == 0 {
        log::debug!("Extraction job for proof image {} already exists", proof_image_id);
    }

    find_by_proof_image_id(db, proof_image_id)?
        .ok_or(DatabaseError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
}

pub fn find_by_id(db: &Database, id: &str) -> Result<Option<ExtractionJob>, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn
            .query_row(
                "SELECT * FROM proof_extraction_jobs WHERE id = ?1",
                params![id],
                ExtractionJob::from_row,
            )
            .optional()?)
    })
}

pub fn find_by_proof_image_id(
    db: &Database,
    proof_image_id: &str,
) -> Result<Option<ExtractionJob>, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn
            .query_row(
                "SELECT * FROM proof_extraction_jobs WHERE proof_image_id = ?1",
                params![proof_image_id],
                ExtractionJob::from_row,
            )
            .optional()?)
    })
}

/// Leases the oldest leasable job, moving on to the next candidate whenever
/// another worker wins the race for the current one.
///
/// `stale_before` enables reclaiming PROCESSING jobs whose lease was taken
/// before that instant. Returns `None` when nothing is leasable.
pub fn lease_next(
    db: &Database,
    now: DateTime<Utc>,
    stale_before: Option<DateTime<Utc>>,
) -> Result<Option<LeasedJob>, DatabaseError> {
    let cutoff = stale_before.map(format_timestamp);
    let candidates: Vec<String> = db.with_conn(|conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT id FROM proof_extraction_jobs WHERE {LEASABLE}
             ORDER BY created_at ASC, rowid ASC"
        ))?;
        let ids = stmt
            .query_map(params![cutoff], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    })?;

    for id in candidates {
        if let Some(leased) = try_lease(db, &id, now, stale_before)? {
            return Ok(Some(leased));
        }
        log::debug!("Lost lease race for job {}, trying next candidate", id);
    }

    Ok(None)
}

/// Compare-and-swap lease on one job. `None` means the job was not leasable anymore.
pub fn try_lease(
    db: &Database,
    id: &str,
    now: DateTime<Utc>,
    stale_before: Option<DateTime<Utc>>,
) -> Result<Option<LeasedJob>, DatabaseError> {
    let cutoff = stale_before.map(format_timestamp);
    let locked_at = format_timestamp(now);

    db.with_conn(|conn| {
        let reclaimed: Option<String> = conn
            .query_row(
                "SELECT locked_at FROM proof_extraction_jobs WHERE id = ?1 AND status = 'PROCESSING'",
                params![id],
                |row| row.get(0),
            )
            .optional()?
            .flatten();

        let changed = conn.execute(
            &format!(
                "UPDATE proof_extraction_jobs
                 SET status = 'PROCESSING', locked_at = ?2, attempts = attempts + 1, updated_at = ?2
                 WHERE id = ?3 AND {LEASABLE}"
            ),
            params![cutoff, locked_at, id],
        )?;

        if changed == 0 {
            return Ok(None);
        }

        if let Some(previous) = reclaimed {
            log::warn!("Reclaimed stale lease on job {} (locked at {})", id, previous);
        }

        let job = conn.query_row(
            "SELECT id, proof_image_id, attempts, locked_at FROM proof_extraction_jobs WHERE id = ?1",
            params![id],
            |row| {
                Ok(LeasedJob {
                    id: row.get(0)?,
                    proof_image_id: row.get(1)?,
                    attempts: row.get(2)?,
                    locked_at: row.get(3)?,
                })
            },
        )?;
        Ok(Some(job))
    })
}

// Terminal writes only apply while the caller's lease is the current one.
const HELD: &str = "id = ?1 AND status = 'PROCESSING' AND locked_at = ?2 AND attempts = ?3";

/// Releases the lease and marks the job COMPLETED.
///
/// Returns false when the lease was lost to a reclaim; the row is left untouched.
pub fn mark_completed(db: &Database, lease: &LeasedJob) -> Result<bool, DatabaseError> {
    let now = now_timestamp();
    db.with_conn(|conn| {
        let changed = conn.execute(
            &format!(
                "UPDATE proof_extraction_jobs
                 SET status = 'COMPLETED', locked_at = NULL, last_error = NULL, updated_at = ?4
                 WHERE {HELD}"
            ),
            params![lease.id, lease.locked_at, lease.attempts, now],
        )?;
        Ok(changed > 0)
    })
}

/// Releases the lease and marks the job FAILED with a truncated error message.
///
/// Returns false when the lease was lost to a reclaim; the row is left untouched.
pub fn mark_failed(db: &Database, lease: &LeasedJob, error: &str) -> Result<bool, DatabaseError> {
    let now = now_timestamp();
    let message = truncate_error(error);
    db.with_conn(|conn| {
        let changed = conn.execute(
            &format!(
                "UPDATE proof_extraction_jobs
                 SET status = 'FAILED', locked_at = NULL, last_error = ?4, updated_at = ?5
                 WHERE {HELD}"
            ),
            params![lease.id, lease.locked_at, lease.attempts, message, now],
        )?;
        Ok(changed > 0)
    })
}

/// Moves a FAILED job back to NOT_CHECKED. Returns false when the image has no failed job.
pub fn requeue_failed(db: &Database, proof_image_id: &str) -> Result<bool, DatabaseError> {
    let now = now_timestamp();
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE proof_extraction_jobs
             SET status = 'NOT_CHECKED', locked_at = NULL, last_error = NULL, updated_at = ?2
             WHERE proof_image_id = ?1 AND status = 'FAILED'",
            params![proof_image_id, now],
        )?;
        Ok(changed > 0)
    })
}

/// Counts jobs with the given status.
pub fn count_by_status(db: &Database, status: ExtractionStatus) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM proof_extraction_jobs WHERE status = ?1",
            params![status.as_str()],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, minute, 0).unwrap()
    }

    fn set_created_at(db: &Database, proof_image_id: &str, created_at: &str) {
        db.with_conn(|conn| {
            conn.execute(
                "UPDATE proof_extraction_jobs SET created_at = ?2 WHERE proof_image_id = ?1",
                params![proof_image_id, created_at],
            )?;
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_enqueue_is_idempotent() {
        let db = test_db();
        let first = enqueue(&db, "img-1").unwrap();
        let second = enqueue(&db, "img-1").unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.status, ExtractionStatus::NotChecked);
        assert_eq!(first.attempts, 0);
        assert_eq!(count_by_status(&db, ExtractionStatus::NotChecked).unwrap(), 1);
    }

    #[test]
    fn test_find_nonexistent() {
        let db = test_db();
        assert!(find_by_id(&db, "nope").unwrap().is_none());
        assert!(find_by_proof_image_id(&db, "nope").unwrap().is_none());
    }

    #[test]
    fn test_lease_sets_processing_and_increments_attempts() {
        let db = test_db();
        let job = enqueue(&db, "img-1").unwrap();

        let leased = lease_next(&db, at(0), None).unwrap().unwrap();
        assert_eq!(leased.id, job.id);
        assert_eq!(leased.proof_image_id, "img-1");
        assert_eq!(leased.attempts, 1);
        assert_eq!(leased.locked_at, format_timestamp(at(0)));

        let row = find_by_id(&db, &job.id).unwrap().unwrap();
        assert_eq!(row.status, ExtractionStatus::Processing);
        assert!(row.locked_at.is_some());
    }

    #[test]
    fn test_lease_is_exclusive() {
        let db = test_db();
        let job = enqueue(&db, "img-1").unwrap();

        assert!(try_lease(&db, &job.id, at(0), None).unwrap().is_some());
        assert!(try_lease(&db, &job.id, at(1), None).unwrap().is_none());
        assert!(lease_next(&db, at(1), None).unwrap().is_none());
    }

    #[test]
    fn test_lease_is_fifo() {
        let db = test_db();
        enqueue(&db, "newer").unwrap();
        enqueue(&db, "older").unwrap();
        set_created_at(&db, "newer", "2026-01-01T10:00:00.000Z");
        set_created_at(&db, "older", "2026-01-01T09:00:00.000Z");

        let first = lease_next(&db, at(0), None).unwrap().unwrap();
        let second = lease_next(&db, at(0), None).unwrap().unwrap();
        assert_eq!(first.proof_image_id, "older");
        assert_eq!(second.proof_image_id, "newer");
    }

    #[test]
    fn test_pending_jobs_are_not_leased() {
        let db = test_db();
        let job = enqueue(&db, "img-1").unwrap();
        db.with_conn(|conn| {
            conn.execute(
                "UPDATE proof_extraction_jobs SET status = 'PENDING' WHERE id = ?1",
                params![job.id],
            )?;
            Ok(())
        })
        .unwrap();

        assert!(lease_next(&db, at(0), None).unwrap().is_none());
    }

    #[test]
    fn test_stale_lease_reclaim() {
        let db = test_db();
        enqueue(&db, "img-1").unwrap();
        lease_next(&db, at(0), None).unwrap().unwrap();

        // Without a cutoff, or with a cutoff before the lease, nothing is leasable.
        assert!(lease_next(&db, at(30), None).unwrap().is_none());
        assert!(lease_next(&db, at(30), Some(at(0))).unwrap().is_none());

        let reclaimed = lease_next(&db, at(30), Some(at(30) - Duration::minutes(15)))
            .unwrap()
            .unwrap();
        assert_eq!(reclaimed.attempts, 2);
        assert_eq!(reclaimed.locked_at, format_timestamp(at(30)));

        // The fresh lease is no longer stale for a second reclaimer.
        assert!(lease_next(&db, at(31), Some(at(16))).unwrap().is_none());
    }

    #[test]
    fn test_mark_completed_clears_lock_and_error() {
        let db = test_db();
        let job = enqueue(&db, "img-1").unwrap();
        let leased = lease_next(&db, at(0), None).unwrap().unwrap();
        assert!(mark_completed(&db, &leased).unwrap());

        let row = find_by_id(&db, &job.id).unwrap().unwrap();
        assert_eq!(row.status, ExtractionStatus::Completed);
        assert!(row.locked_at.is_none());
        assert!(row.last_error.is_none());
    }

    #[test]
    fn test_mark_failed_truncates_message() {
        let db = test_db();
        let job = enqueue(&db, "img-1").unwrap();
        let leased = lease_next(&db, at(0), None).unwrap().unwrap();
        assert!(mark_failed(&db, &leased, &"x".repeat(1500)).unwrap());

        let row = find_by_id(&db, &job.id).unwrap().unwrap();
        assert_eq!(row.status, ExtractionStatus::Failed);
        assert!(row.locked_at.is_none());
        assert_eq!(row.last_error.unwrap().chars().count(), 1000);

        // Failure is terminal: the job is not leased again.
        assert!(lease_next(&db, at(1), None).unwrap().is_none());
    }

    #[test]
    fn test_requeue_failed() {
        let db = test_db();
        let job = enqueue(&db, "img-1").unwrap();
        assert!(!requeue_failed(&db, "img-1").unwrap());

        let leased = lease_next(&db, at(0), None).unwrap().unwrap();
        mark_failed(&db, &leased, "boom").unwrap();
        assert!(requeue_failed(&db, "img-1").unwrap());

        let row = find_by_id(&db, &job.id).unwrap().unwrap();
        assert_eq!(row.status, ExtractionStatus::NotChecked);
        assert_eq!(row.attempts, 1);
        assert!(row.last_error.is_none());

        let leased = lease_next(&db, at(5), None).unwrap().unwrap();
        assert_eq!(leased.attempts, 2);
    }

    #[test]
    fn test_stale_holder_cannot_finish_reclaimed_job() {
        let db = test_db();
        let job = enqueue(&db, "img-1").unwrap();
        let stale = lease_next(&db, at(0), None).unwrap().unwrap();
        let current = lease_next(&db, at(30), Some(at(20))).unwrap().unwrap();
        assert_eq!(current.id, stale.id);

        assert!(!mark_completed(&db, &stale).unwrap());
        assert!(!mark_failed(&db, &stale, "late").unwrap());

        let row = find_by_id(&db, &job.id).unwrap().unwrap();
        assert_eq!(row.status, ExtractionStatus::Processing);
        assert_eq!(row.locked_at.as_deref(), Some(current.locked_at.as_str()));
        assert!(row.last_error.is_none());

        assert!(mark_completed(&db, &current).unwrap());
        let row = find_by_id(&db, &job.id).unwrap().unwrap();
        assert_eq!(row.status, ExtractionStatus::Completed);
    }

    #[test]
    fn test_finishing_twice_is_a_no_op() {
        let db = test_db();
        let job = enqueue(&db, "img-1").unwrap();
        let leased = lease_next(&db, at(0), None).unwrap().unwrap();

        assert!(mark_completed(&db, &leased).unwrap());
        assert!(!mark_failed(&db, &leased, "late").unwrap());

        let row = find_by_id(&db, &job.id).unwrap().unwrap();
        assert_eq!(row.status, ExtractionStatus::Completed);
        assert!(row.last_error.is_none());
    }

    #[test]
    fn test_count_by_status() {
        let db = test_db();
        enqueue(&db, "a").unwrap();
        enqueue(&db, "b").unwrap();
        let leased = lease_next(&db, at(0), None).unwrap().unwrap();
        mark_failed(&db, &leased, "nope").unwrap();

        assert_eq!(count_by_status(&db, ExtractionStatus::NotChecked).unwrap(), 1);
        assert_eq!(count_by_status(&db, ExtractionStatus::Failed).unwrap(), 1);
        assert_eq!(count_by_status(&db, ExtractionStatus::Completed).unwrap(), 0);
    }
}
