pub const SCHEMA: &str = r#"
-- Subjects are the tagged entities. Hosts with their own subject table
-- can mirror ids into this one or replace the backend entirely.
CREATE TABLE IF NOT EXISTS subjects (
    id TEXT PRIMARY KEY,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Tags are shared across subjects; frequency tracks the number of live
-- associations referencing the tag
CREATE TABLE IF NOT EXISTS tags (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    frequency INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Many-to-many relationship between subjects and tags
CREATE TABLE IF NOT EXISTS subject_tags (
    subject_id TEXT REFERENCES subjects(id) ON DELETE CASCADE,
    tag_id TEXT REFERENCES tags(id) ON DELETE CASCADE,
    PRIMARY KEY (subject_id, tag_id)
);

-- Create indexes
CREATE INDEX IF NOT EXISTS idx_subject_tags_tag ON subject_tags(tag_id);
"#;
