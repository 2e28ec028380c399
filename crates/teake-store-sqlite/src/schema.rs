//! SQL schema for the TeaKE SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id             TEXT PRIMARY KEY,
    email               TEXT,
    nickname            TEXT NOT NULL,
    verification_status TEXT NOT NULL DEFAULT 'unset',
    created_at          TEXT NOT NULL
);

-- Only SHA-256 digests of bearer tokens are stored.
CREATE TABLE IF NOT EXISTS sessions (
    token_digest TEXT PRIMARY KEY,
    user_id      TEXT NOT NULL REFERENCES users(user_id),
    created_at   TEXT NOT NULL
);

-- `seq` gives a stable insertion order for search results.
CREATE TABLE IF NOT EXISTS guys (
    seq                INTEGER PRIMARY KEY AUTOINCREMENT,
    guy_id             TEXT NOT NULL UNIQUE,
    name               TEXT,
    phone              TEXT,            -- canonical form
    socials            TEXT,
    -- Unicode-lowercased copies for search; SQLite's lower() folds ASCII only.
    name_folded        TEXT,
    socials_folded     TEXT,
    location           TEXT,
    age                INTEGER,
    created_by_user_id TEXT NOT NULL,
    created_at         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS stories (
    story_id   TEXT PRIMARY KEY,
    guy_id     TEXT NOT NULL REFERENCES guys(guy_id),
    user_id    TEXT NOT NULL,
    text       TEXT NOT NULL,
    tags       TEXT NOT NULL,           -- JSON array of tag names
    image_url  TEXT,
    anonymous  INTEGER NOT NULL,
    nickname   TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS guys_phone_idx     ON guys(phone);
CREATE INDEX IF NOT EXISTS stories_guy_idx    ON stories(guy_id);
CREATE INDEX IF NOT EXISTS sessions_user_idx  ON sessions(user_id);

PRAGMA user_version = 1;
";
