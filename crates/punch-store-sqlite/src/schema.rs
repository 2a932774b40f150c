//! SQL schema for the punch SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Maintained out of band (see `punch employee`); read-only to the bot.
CREATE TABLE IF NOT EXISTS employees (
    telegram_id INTEGER PRIMARY KEY,
    name        TEXT NOT NULL,
    is_active   TEXT NOT NULL DEFAULT 'TRUE',   -- compared case-insensitively
    created_at  TEXT NOT NULL
);

-- One row per employee per local calendar day.
-- A row is inserted with status 'IN' and updated at most once, to 'OUT'.
CREATE TABLE IF NOT EXISTS attendance (
    record_id     TEXT PRIMARY KEY,
    telegram_id   INTEGER NOT NULL,
    employee_name TEXT NOT NULL,
    date          TEXT NOT NULL,      -- YYYY-MM-DD in `timezone`
    timezone      TEXT NOT NULL,      -- IANA name
    check_in_at   TEXT NOT NULL,      -- RFC 3339 UTC
    check_in_lat  REAL NOT NULL,
    check_in_lng  REAL NOT NULL,
    arrival       TEXT NOT NULL,      -- 'Present' | 'Late' | 'Invalid'
    check_out_at  TEXT,
    check_out_lat REAL,
    check_out_lng REAL,
    total_hours   REAL,
    status        TEXT NOT NULL,      -- 'IN' | 'OUT'
    UNIQUE (telegram_id, date),
    CHECK (
      (status = 'IN'  AND check_out_at IS NULL     AND total_hours IS NULL) OR
      (status = 'OUT' AND check_out_at IS NOT NULL AND total_hours IS NOT NULL)
    )
);

CREATE INDEX IF NOT EXISTS attendance_date_idx ON attendance(date);

PRAGMA user_version = 1;
";
