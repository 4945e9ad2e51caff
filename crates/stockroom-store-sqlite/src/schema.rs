//! SQL schema for the Stockroom SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per subject; rows are updated in place, never deleted.
CREATE TABLE IF NOT EXISTS profiles (
    subject_id    TEXT PRIMARY KEY,
    display_name  TEXT NOT NULL,
    role          TEXT NOT NULL DEFAULT 'intruso',  -- 'intruso' | 'membro' | 'gerente'
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

-- Ownable record tables. owner_id is NULL while the record is orphaned and
-- only ever moves from NULL to a subject through a conditional UPDATE.
CREATE TABLE IF NOT EXISTS assets (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    owner_id    TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    owner_id    TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS suppliers (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    owner_id    TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS locations (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    owner_id    TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS customers (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    owner_id    TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS assets_owner_idx     ON assets(owner_id);
CREATE INDEX IF NOT EXISTS categories_owner_idx ON categories(owner_id);
CREATE INDEX IF NOT EXISTS suppliers_owner_idx  ON suppliers(owner_id);
CREATE INDEX IF NOT EXISTS locations_owner_idx  ON locations(owner_id);
CREATE INDEX IF NOT EXISTS customers_owner_idx  ON customers(owner_id);

PRAGMA user_version = 1;
";
