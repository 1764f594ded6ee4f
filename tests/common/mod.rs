#![allow(dead_code)]

use duckdb::Connection;
use std::path::Path;
use tempfile::TempDir;

use osm_changesets::patterns::EditorPattern;
use osm_changesets::queries::sql_string;
use osm_changesets::{QueryBuilder, UrlTemplate, YearRange};

/// One fixture changeset row.
#[derive(Debug, Clone)]
pub struct Changeset {
    pub uid: Option<i64>,
    pub opened: String,
    pub num_changes: i32,
    pub comments_count: i32,
    pub created_by: Option<String>,
    pub locale: Option<String>,
}

impl Changeset {
    pub fn new(year: i32, uid: i64, num_changes: i32) -> Self {
        Self {
            uid: Some(uid),
            opened: format!("{year}-06-15 12:00:00"),
            num_changes,
            comments_count: 0,
            created_by: Some("JOSM/1.5".into()),
            locale: None,
        }
    }

    pub fn opened(mut self, timestamp: &str) -> Self {
        self.opened = timestamp.to_string();
        self
    }

    pub fn comments(mut self, count: i32) -> Self {
        self.comments_count = count;
        self
    }

    pub fn created_by(mut self, editor: Option<&str>) -> Self {
        self.created_by = editor.map(str::to_string);
        self
    }

    pub fn locale(mut self, locale: Option<&str>) -> Self {
        self.locale = locale.map(str::to_string);
        self
    }
}

fn literal(value: Option<&str>) -> String {
    value.map(sql_string).unwrap_or_else(|| "NULL".to_string())
}

/// Year-partitioned Parquet files in a temporary directory.
pub struct Dataset {
    pub dir: TempDir,
    conn: Connection,
}

impl Dataset {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
            conn: Connection::open_in_memory().expect("fixture connection"),
        }
    }

    pub fn template(&self) -> UrlTemplate {
        UrlTemplate::parse(&format!("{}/{{year}}.parquet", self.dir.path().display()))
            .expect("fixture template")
    }

    pub fn path_for(&self, year: i32) -> std::path::PathBuf {
        self.dir.path().join(format!("{year}.parquet"))
    }

    pub fn write(&self, year: i32, rows: &[Changeset]) -> &Self {
        write_partition(&self.conn, &self.path_for(year), year, rows);
        self
    }

    pub fn builder(&self, patterns: Vec<EditorPattern>, years: YearRange) -> QueryBuilder {
        QueryBuilder::new(self.template(), patterns, years)
    }
}

fn write_partition(conn: &Connection, path: &Path, year: i32, rows: &[Changeset]) {
    // A placeholder row keeps the VALUES list typed; it is filtered out for empty partitions.
    let placeholder = [Changeset::new(year, 0, 0)];
    let (rows, filter) = if rows.is_empty() {
        (&placeholder[..], "WHERE false")
    } else {
        (rows, "")
    };

    let values = rows
        .iter()
        .enumerate()
        .map(|(id, row)| {
            format!(
                "({}, {}, {}, {}, {}, {}, {})",
                id + 1,
                sql_string(&row.opened),
                row.uid.map(|u| u.to_string()).unwrap_or_else(|| "NULL".into()),
                row.num_changes,
                row.comments_count,
                literal(row.created_by.as_deref()),
                literal(row.locale.as_deref()),
            )
        })
        .collect::<Vec<_>>()
        .join(",\n");

    let sql = format!(
        "COPY (
    SELECT
        id::BIGINT id,
        created_at::TIMESTAMP created_at,
        uid::BIGINT uid,
        num_changes::INTEGER num_changes,
        comments_count::INTEGER comments_count,
        map(['created_by', 'locale'], [created_by::VARCHAR, locale::VARCHAR]) tags
    FROM (VALUES {values}) t(id, created_at, uid, num_changes, comments_count, created_by, locale)
    {filter}
) TO {} (FORMAT PARQUET)",
        sql_string(&path.display().to_string())
    );
    conn.execute_batch(&sql).expect("write parquet partition");
}
