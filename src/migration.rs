// 🔁 Legacy migration - copy old storage keys into the current shapes, once
//
// Old data lived under `vivaa_classes` / `vivaa_students` with different
// field names (`class_id`, `money`, `credit`). The migration converts every
// record it can, skips the ones it cannot, and writes a marker key so a
// second run does nothing. Legacy keys are never modified.

use crate::entities::{Classroom, Student};
use crate::error::Result;
use crate::schema::Validate;
use crate::storage::Storage;
use crate::stores::keys;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const LEGACY_CLASSES_KEY: &str = "vivaa_classes";
pub const LEGACY_STUDENTS_KEY: &str = "vivaa_students";
pub const MIGRATION_MARKER_KEY: &str = "vivaatown:migration:v1";

#[derive(Debug, Deserialize)]
struct LegacyClass {
    id: String,
    name: String,
    #[serde(default)]
    teacher: String,
    #[serde(default, rename = "taxRate")]
    tax_rate: Option<f64>,
    #[serde(default, rename = "createdAt")]
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct LegacyStudent {
    id: String,
    name: String,
    class_id: String,
    #[serde(default)]
    money: f64,
    #[serde(default)]
    credit: Option<u16>,
    #[serde(default)]
    number: Option<String>,
}

impl LegacyClass {
    fn into_classroom(self) -> Classroom {
        Classroom {
            id: self.id,
            name: self.name,
            teacher_name: self.teacher,
            currency_name: crate::entities::classroom::DEFAULT_CURRENCY.to_string(),
            tax_rate: self.tax_rate.unwrap_or(0.0),
            treasury: 0.0,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        }
    }
}

impl LegacyStudent {
    fn into_student(self) -> Student {
        Student {
            id: self.id,
            classroom_id: self.class_id,
            name: self.name,
            student_number: self.number.unwrap_or_default(),
            balance: self.money,
            credit_score: self
                .credit
                .unwrap_or(crate::entities::student::DEFAULT_CREDIT_SCORE),
            job_id: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub already_migrated: bool,
    pub classrooms: usize,
    pub students: usize,
    pub skipped: usize,
}

/// Parse a legacy array, converting and validating each element
fn convert<L, T, F>(storage: &Storage, key: &str, into_record: F, report: &mut MigrationReport) -> Result<Vec<T>>
where
    L: serde::de::DeserializeOwned,
    T: Validate,
    F: Fn(L) -> T,
{
    let Some(raw) = storage.get(key)? else {
        return Ok(Vec::new());
    };

    let values: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
        Ok(values) => values,
        Err(e) => {
            warn!(key, error = %e, "legacy value is not a JSON array, skipping");
            return Ok(Vec::new());
        }
    };

    let mut out = Vec::new();
    for (index, value) in values.into_iter().enumerate() {
        let record = match serde_json::from_value::<L>(value) {
            Ok(legacy) => into_record(legacy),
            Err(e) => {
                warn!(key, index, error = %e, "skipping unreadable legacy record");
                report.skipped += 1;
                continue;
            }
        };
        if let Err(errors) = record.validate() {
            warn!(key, index, errors = errors.len(), "skipping invalid legacy record");
            report.skipped += 1;
            continue;
        }
        out.push(record);
    }
    Ok(out)
}

/// Append `incoming` to the collection at `key`, skipping ids already present
fn merge<T>(storage: &Storage, key: &str, incoming: Vec<T>, id: fn(&T) -> &str) -> Result<usize>
where
    T: serde::de::DeserializeOwned + Serialize + Validate,
{
    let mut current: Vec<T> = storage.load_collection(key)?;
    let mut added = 0;
    for record in incoming {
        if current.iter().any(|existing| id(existing) == id(&record)) {
            continue;
        }
        current.push(record);
        added += 1;
    }
    storage.save_collection(key, &current)?;
    Ok(added)
}

/// Copy legacy keys into the current collections. Safe to call on every start.
pub fn migrate_legacy(storage: &Storage) -> Result<MigrationReport> {
    let mut report = MigrationReport::default();

    if storage.contains(MIGRATION_MARKER_KEY)? {
        report.already_migrated = true;
        return Ok(report);
    }

    let classrooms = convert(storage, LEGACY_CLASSES_KEY, LegacyClass::into_classroom, &mut report)?;
    let students = convert(storage, LEGACY_STUDENTS_KEY, LegacyStudent::into_student, &mut report)?;

    if !classrooms.is_empty() {
        report.classrooms = merge(storage, keys::CLASSROOMS, classrooms, |c: &Classroom| &c.id)?;
    }
    if !students.is_empty() {
        report.students = merge(storage, keys::STUDENTS, students, |s: &Student| &s.id)?;
    }

    storage.set(MIGRATION_MARKER_KEY, &Utc::now().to_rfc3339())?;
    info!(
        classrooms = report.classrooms,
        students = report.students,
        skipped = report.skipped,
        "legacy migration complete"
    );
    Ok(report)
}
