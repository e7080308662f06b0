//! Proof image repository.

use rusqlite::{params, OptionalExtension, Row};

use super::{now_timestamp, status_column, Database, DatabaseError};
use crate::status::ValidationStatus;

#[derive(Debug, Clone, PartialEq)]
pub struct ProofImage {
    pub id: String,
    pub storage_path: String,
    pub mime_type: Option<String>,
    /// Set once the client confirmed the upload finished.
    pub uploaded_at: Option<String>,
    pub validation_status: ValidationStatus,
    pub extracted_fields: Option<serde_json::Value>,
    pub extraction_confidence: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

impl ProofImage {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let extracted: Option<String> = row.get("extracted_fields")?;
        let extracted_fields = extracted
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;

        Ok(Self {
            id: row.get("id")?,
            storage_path: row.get("storage_path")?,
            mime_type: row.get("mime_type")?,
            uploaded_at: row.get("uploaded_at")?,
            validation_status: status_column(row, "validation_status")?,
            extracted_fields,
            extraction_confidence: row.get("extraction_confidence")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Registers a proof image awaiting upload.
pub fn insert(
    db: &Database,
    storage_path: &str,
    mime_type: Option<&str>,
) -> Result<ProofImage, DatabaseError> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = now_timestamp();
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO proof_images (id, storage_path, mime_type, validation_status, created_at, updated_at)
             VALUES (?1, ?2, ?3, 'NOT_CHECKED', ?4, ?4)",
            params![id, storage_path, mime_type, now],
        )?;
        Ok(())
    })?;

    find_by_id(db, &id)?.ok_or(DatabaseError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
}

pub fn find_by_id(db: &Database, id: &str) -> Result<Option<ProofImage>, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn
            .query_row(
                "SELECT * FROM proof_images WHERE id = ?1",
                params![id],
                ProofImage::from_row,
            )
            .optional()?)
    })
}

/// Records upload completion. Returns false if the image does not exist.
pub fn mark_uploaded(db: &Database, id: &str) -> Result<bool, DatabaseError> {
    let now = now_timestamp();
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE proof_images SET uploaded_at = ?2, updated_at = ?2 WHERE id = ?1",
            params![id, now],
        )?;
        Ok(changed > 0)
    })
}

/// Writes the extraction result only while the image is still awaiting review.
///
/// Returns false when no row matched, which means a reviewer decided in the meantime
/// (or the image is gone).
pub fn update_if_pending(
    db: &Database,
    id: &str,
    status: ValidationStatus,
    extracted_fields: &serde_json::Value,
    confidence: Option<f64>,
) -> Result<bool, DatabaseError> {
    let now = now_timestamp();
    let extracted = serde_json::to_string(extracted_fields)?;
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE proof_images
             SET validation_status = ?2, extracted_fields = ?3, extraction_confidence = ?4, updated_at = ?5
             WHERE id = ?1 AND validation_status IN ('NOT_CHECKED', 'PENDING', 'EXTRACTION_INCOMPLETE')",
            params![id, status.as_str(), extracted, confidence, now],
        )?;
        Ok(changed > 0)
    })
}

/// Records a reviewer's decision unconditionally.
pub fn set_review_status(
    db: &Database,
    id: &str,
    status: ValidationStatus,
) -> Result<bool, DatabaseError> {
    let now = now_timestamp();
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE proof_images SET validation_status = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, status.as_str(), now],
        )?;
        Ok(changed > 0)
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    #[test]
    fn test_insert_and_find() {
        let db = test_db();
        let image = insert(&db, "athletes/a1/proof.jpg", Some("image/jpeg")).unwrap();

        let found = find_by_id(&db, &image.id).unwrap().unwrap();
        assert_eq!(found.storage_path, "athletes/a1/proof.jpg");
        assert_eq!(found.mime_type.as_deref(), Some("image/jpeg"));
        assert_eq!(found.validation_status, ValidationStatus::NotChecked);
        assert!(found.uploaded_at.is_none());
        assert!(found.extracted_fields.is_none());
    }

    #[test]
    fn test_mark_uploaded() {
        let db = test_db();
        let image = insert(&db, "p.jpg", None).unwrap();
        assert!(mark_uploaded(&db, &image.id).unwrap());
        assert!(!mark_uploaded(&db, "missing").unwrap());

        let found = find_by_id(&db, &image.id).unwrap().unwrap();
        assert!(found.uploaded_at.is_some());
    }

    #[test]
    fn test_update_if_pending_writes_fields() {
        let db = test_db();
        let image = insert(&db, "p.jpg", None).unwrap();
        let fields = json!({ "minutes": 45, "distanceKm": 10.0 });

        assert!(update_if_pending(&db, &image.id, ValidationStatus::Pending, &fields, Some(0.9)).unwrap());

        let found = find_by_id(&db, &image.id).unwrap().unwrap();
        assert_eq!(found.validation_status, ValidationStatus::Pending);
        assert_eq!(found.extracted_fields, Some(fields));
        assert_eq!(found.extraction_confidence, Some(0.9));
    }

    #[test]
    fn test_update_if_pending_respects_review() {
        let db = test_db();
        let image = insert(&db, "p.jpg", None).unwrap();
        set_review_status(&db, &image.id, ValidationStatus::Rejected).unwrap();

        let updated =
            update_if_pending(&db, &image.id, ValidationStatus::Verified, &json!({}), None).unwrap();
        assert!(!updated);

        let found = find_by_id(&db, &image.id).unwrap().unwrap();
        assert_eq!(found.validation_status, ValidationStatus::Rejected);
        assert!(found.extracted_fields.is_none());
    }

    #[test]
    fn test_update_if_pending_from_incomplete() {
        let db = test_db();
        let image = insert(&db, "p.jpg", None).unwrap();
        update_if_pending(&db, &image.id, ValidationStatus::ExtractionIncomplete, &json!({}), None)
            .unwrap();

        assert!(update_if_pending(&db, &image.id, ValidationStatus::Verified, &json!({}), None).unwrap());
    }
}
