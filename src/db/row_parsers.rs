use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::org::{Department, Employee, Position};
use crate::models::permission::Permission;

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, AppError> {
    let s = s.trim();

    // RFC3339 first (e.g. 2025-11-19T12:34:56Z)
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // SQLite default timestamp format: "YYYY-MM-DD HH:MM:SS" (with optional fractional seconds)
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }

    Err(AppError::internal(format!("invalid datetime: {}", s)))
}

fn get_string(row: &SqliteRow, col: &str) -> Result<String, AppError> {
    row.try_get(col)
        .map_err(|e| AppError::internal(format!("missing {}: {}", col, e)))
}

fn get_opt_string(row: &SqliteRow, col: &str) -> Result<Option<String>, AppError> {
    row.try_get(col)
        .map_err(|e| AppError::internal(format!("missing {}: {}", col, e)))
}

fn parse_uuid(s: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(s).map_err(|e| AppError::internal(format!("invalid uuid: {}", e)))
}

fn get_uuid(row: &SqliteRow, col: &str) -> Result<Uuid, AppError> {
    parse_uuid(&get_string(row, col)?)
}

fn get_opt_uuid(row: &SqliteRow, col: &str) -> Result<Option<Uuid>, AppError> {
    get_opt_string(row, col)?.map(|s| parse_uuid(&s)).transpose()
}

fn get_datetime(row: &SqliteRow, col: &str) -> Result<DateTime<Utc>, AppError> {
    parse_datetime(&get_string(row, col)?)
}

fn get_bool(row: &SqliteRow, col: &str) -> Result<bool, AppError> {
    let value: i64 = row
        .try_get(col)
        .map_err(|e| AppError::internal(format!("missing {}: {}", col, e)))?;
    Ok(value != 0)
}

pub fn employee_from_row(row: &SqliteRow) -> Result<Employee, AppError> {
    Ok(Employee {
        id: get_uuid(row, "id")?,
        name: get_string(row, "name")?,
        email: get_string(row, "email")?,
        position_id: get_opt_uuid(row, "position_id")?,
        is_admin: get_bool(row, "is_admin")?,
        created_at: get_datetime(row, "created_at")?,
        updated_at: get_datetime(row, "updated_at")?,
    })
}

pub fn position_from_row(row: &SqliteRow) -> Result<Position, AppError> {
    Ok(Position {
        id: get_uuid(row, "id")?,
        title: get_string(row, "title")?,
        department_id: get_uuid(row, "department_id")?,
        created_at: get_datetime(row, "created_at")?,
        updated_at: get_datetime(row, "updated_at")?,
    })
}

pub fn department_from_row(row: &SqliteRow) -> Result<Department, AppError> {
    Ok(Department {
        id: get_uuid(row, "id")?,
        name: get_string(row, "name")?,
        parent_id: get_opt_uuid(row, "parent_id")?,
        created_at: get_datetime(row, "created_at")?,
        updated_at: get_datetime(row, "updated_at")?,
    })
}

pub fn permission_from_row(row: &SqliteRow) -> Result<Permission, AppError> {
    Ok(Permission {
        id: get_uuid(row, "id")?,
        code: get_string(row, "code")?,
        title: get_string(row, "title")?,
        description: get_opt_string(row, "description")?,
        default_access: get_bool(row, "default_access")?,
        created_at: get_datetime(row, "created_at")?,
        updated_at: get_datetime(row, "updated_at")?,
    })
}
