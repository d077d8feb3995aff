//! SQL DDL for the registration database (SQLite).

/// Tables for users, visitors and the three visitor child tables.
/// Every table carries a nullable `deleted_at`; reads filter on it.
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT UNIQUE NOT NULL,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'user',
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    deleted_at DATETIME
);

CREATE TABLE IF NOT EXISTS visitors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    academic_degree TEXT,
    company_name TEXT,
    job_position TEXT,
    field_of_activity TEXT,
    is_manufacturer INTEGER NOT NULL DEFAULT 0,
    is_trader INTEGER NOT NULL DEFAULT 0,
    is_distributor INTEGER NOT NULL DEFAULT 0,
    note TEXT,
    created_by INTEGER REFERENCES users(id),
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    deleted_at DATETIME
);

CREATE TABLE IF NOT EXISTS contacts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    visitor_id INTEGER NOT NULL,
    type TEXT NOT NULL,
    value TEXT NOT NULL,
    label TEXT,
    deleted_at DATETIME,
    FOREIGN KEY(visitor_id) REFERENCES visitors(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS photos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    visitor_id INTEGER NOT NULL,
    filename TEXT NOT NULL,
    url TEXT NOT NULL,
    original_name TEXT,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    deleted_at DATETIME,
    FOREIGN KEY(visitor_id) REFERENCES visitors(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS voices (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    visitor_id INTEGER NOT NULL,
    filename TEXT NOT NULL,
    url TEXT NOT NULL,
    mime_type TEXT,
    duration_ms INTEGER,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    deleted_at DATETIME,
    FOREIGN KEY(visitor_id) REFERENCES visitors(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_contacts_visitor_id ON contacts(visitor_id);
CREATE INDEX IF NOT EXISTS idx_photos_visitor_id ON photos(visitor_id);
CREATE INDEX IF NOT EXISTS idx_voices_visitor_id ON voices(visitor_id)
"#;

/// Columns added after the first release. Databases created by older builds
/// get them through `ALTER TABLE ... ADD COLUMN`, followed by the optional
/// statement that fills the new column for existing rows.
pub const BACKFILL_COLUMNS: &[(&str, &str, &str, Option<&str>)] = &[
    (
        "users",
        "role",
        "TEXT NOT NULL DEFAULT 'user'",
        Some("UPDATE users SET role = 'admin' WHERE username = 'admin'"),
    ),
    ("users", "deleted_at", "DATETIME", None),
    ("visitors", "academic_degree", "TEXT", None),
    ("visitors", "company_name", "TEXT", None),
    ("visitors", "job_position", "TEXT", None),
    ("visitors", "field_of_activity", "TEXT", None),
    ("visitors", "is_manufacturer", "INTEGER NOT NULL DEFAULT 0", None),
    ("visitors", "is_trader", "INTEGER NOT NULL DEFAULT 0", None),
    ("visitors", "is_distributor", "INTEGER NOT NULL DEFAULT 0", None),
    ("visitors", "created_by", "INTEGER REFERENCES users(id)", None),
    ("visitors", "deleted_at", "DATETIME", None),
    ("contacts", "deleted_at", "DATETIME", None),
    ("photos", "deleted_at", "DATETIME", None),
    ("voices", "deleted_at", "DATETIME", None),
];
