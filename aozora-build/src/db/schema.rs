//! Output database schema
//!
//! Every statement is idempotent (`IF NOT EXISTS`). Tables are listed in
//! creation order; [`OWNED_TABLES`] is the reverse, for dropping.

/// Layout version written to `metadata.style`
pub const SCHEMA_STYLE: &str = "2.1.0";

/// Tables this tool owns, children before parents
pub const OWNED_TABLES: &[&str] = &[
    "work_categories",
    "work_authors",
    "works",
    "authors",
    "anthologies",
    "styles",
    "metadata",
    // Layout 1.x
    "books",
    "card_authors",
    "card_categories",
    "cards",
];

pub const CREATE_METADATA: &str = r#"
    CREATE TABLE IF NOT EXISTS metadata (
        style TEXT NOT NULL,
        commit_hash TEXT NOT NULL,
        date TEXT NOT NULL,
        summary TEXT NOT NULL
    )
"#;

pub const CREATE_STYLES: &str = r#"
    CREATE TABLE IF NOT EXISTS styles (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    )
"#;

pub const CREATE_ANTHOLOGIES: &str = r#"
    CREATE TABLE IF NOT EXISTS anthologies (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        reading TEXT
    )
"#;

pub const CREATE_AUTHORS: &str = r#"
    CREATE TABLE IF NOT EXISTS authors (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        name_reading TEXT NOT NULL,
        name_key TEXT NOT NULL,
        name_roman TEXT NOT NULL,
        surname TEXT,
        given_name TEXT,
        birth TEXT,
        death TEXT,
        copyright_expired BOOLEAN
    )
"#;

pub const CREATE_WORKS: &str = r#"
    CREATE TABLE IF NOT EXISTS works (
        identifier TEXT PRIMARY KEY,
        work_id INTEGER NOT NULL,
        revision INTEGER NOT NULL,
        author_id INTEGER NOT NULL,
        author TEXT NOT NULL,
        title TEXT NOT NULL,
        title_reading TEXT NOT NULL,
        title_key TEXT NOT NULL,
        subtitle TEXT,
        subtitle_reading TEXT,
        subtitle_key TEXT,
        original_title TEXT,
        anthology_id INTEGER,
        style_id INTEGER,
        note TEXT,
        first_published TEXT,
        copyrighted BOOLEAN NOT NULL,
        license TEXT,
        body_raw BLOB NOT NULL,
        body_text_rb_major TEXT NOT NULL,
        body_text_rt_major TEXT NOT NULL,
        colophon_raw BLOB NOT NULL,
        colophon_text TEXT NOT NULL,
        FOREIGN KEY (author_id) REFERENCES authors(id),
        FOREIGN KEY (anthology_id) REFERENCES anthologies(id),
        FOREIGN KEY (style_id) REFERENCES styles(id)
    )
"#;

pub const CREATE_WORK_AUTHORS: &str = r#"
    CREATE TABLE IF NOT EXISTS work_authors (
        id INTEGER PRIMARY KEY,
        identifier TEXT NOT NULL,
        author_id INTEGER NOT NULL,
        role TEXT NOT NULL,
        UNIQUE (identifier, author_id, role),
        FOREIGN KEY (identifier) REFERENCES works(identifier),
        FOREIGN KEY (author_id) REFERENCES authors(id)
    )
"#;

pub const CREATE_WORK_CATEGORIES: &str = r#"
    CREATE TABLE IF NOT EXISTS work_categories (
        id INTEGER PRIMARY KEY,
        identifier TEXT NOT NULL,
        category INTEGER NOT NULL,
        UNIQUE (identifier, category),
        FOREIGN KEY (identifier) REFERENCES works(identifier)
    )
"#;

/// Tables in creation order
pub const TABLES: &[&str] = &[
    CREATE_METADATA,
    CREATE_STYLES,
    CREATE_ANTHOLOGIES,
    CREATE_AUTHORS,
    CREATE_WORKS,
    CREATE_WORK_AUTHORS,
    CREATE_WORK_CATEGORIES,
];

pub const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_authors_name ON authors (name)",
    "CREATE INDEX IF NOT EXISTS idx_authors_name_reading ON authors (name_reading)",
    "CREATE INDEX IF NOT EXISTS idx_authors_name_key ON authors (name_key)",
    "CREATE INDEX IF NOT EXISTS idx_authors_name_roman ON authors (name_roman)",
    "CREATE INDEX IF NOT EXISTS idx_works_work_id ON works (work_id)",
    "CREATE INDEX IF NOT EXISTS idx_works_author_id ON works (author_id)",
    "CREATE INDEX IF NOT EXISTS idx_works_author ON works (author)",
    "CREATE INDEX IF NOT EXISTS idx_works_title ON works (title)",
    "CREATE INDEX IF NOT EXISTS idx_works_title_reading ON works (title_reading)",
    "CREATE INDEX IF NOT EXISTS idx_works_title_key ON works (title_key)",
    "CREATE INDEX IF NOT EXISTS idx_works_subtitle ON works (subtitle)",
    "CREATE INDEX IF NOT EXISTS idx_works_subtitle_reading ON works (subtitle_reading)",
    "CREATE INDEX IF NOT EXISTS idx_works_subtitle_key ON works (subtitle_key)",
    "CREATE INDEX IF NOT EXISTS idx_works_original_title ON works (original_title)",
    "CREATE INDEX IF NOT EXISTS idx_works_anthology_id ON works (anthology_id)",
    "CREATE INDEX IF NOT EXISTS idx_works_style_id ON works (style_id)",
    "CREATE INDEX IF NOT EXISTS idx_work_authors_identifier ON work_authors (identifier)",
    "CREATE INDEX IF NOT EXISTS idx_work_authors_author_id ON work_authors (author_id)",
    "CREATE INDEX IF NOT EXISTS idx_work_categories_category ON work_categories (category)",
];
