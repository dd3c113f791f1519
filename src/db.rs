use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::time::Duration;

use crate::models::{
    CategoryCount, Issue, Stats, DEPARTMENT_UNASSIGNED, STATUS_PENDING, STATUS_RESOLVED,
};

const SCHEMA_VERSION: i32 = 1;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const ISSUE_COLUMNS: &str = "id, category, description, status, department, image_path";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        let version: i32 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap_or(0);

        if version < SCHEMA_VERSION {
            self.conn.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS issues (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    category TEXT NOT NULL,
                    description TEXT NOT NULL,
                    status TEXT NOT NULL DEFAULT 'Pending',
                    department TEXT NOT NULL DEFAULT 'Unassigned',
                    image_path TEXT
                );

                CREATE INDEX IF NOT EXISTS idx_issues_status ON issues(status);
                CREATE INDEX IF NOT EXISTS idx_issues_department ON issues(department);
                CREATE INDEX IF NOT EXISTS idx_issues_category ON issues(category);
                "#,
            )?;

            self.conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        }

        Ok(())
    }

    /// Round-trips a trivial statement; used for the startup connectivity check.
    pub fn ping(&self) -> Result<()> {
        self.conn
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .context("Database did not answer")?;
        Ok(())
    }

    // Issues

    /// Inserts a new issue as Pending/Unassigned and returns the stored row.
    ///
    /// Missing fields are passed through as NULL and rejected by the schema.
    pub fn create_issue(
        &self,
        category: Option<&str>,
        description: Option<&str>,
        image_path: Option<&str>,
    ) -> Result<Issue> {
        let sql = format!(
            "INSERT INTO issues (category, description, status, department, image_path) \
             VALUES (?1, ?2, ?3, ?4, ?5) RETURNING {}",
            ISSUE_COLUMNS
        );
        let issue = self.conn.query_row(
            &sql,
            params![category, description, STATUS_PENDING, DEPARTMENT_UNASSIGNED, image_path],
            issue_from_row,
        )?;
        Ok(issue)
    }

    pub fn get_issue(&self, id: i64) -> Result<Option<Issue>> {
        let sql = format!("SELECT {} FROM issues WHERE id = ?1", ISSUE_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query_map([id], issue_from_row)?;
        Ok(rows.next().transpose()?)
    }

    pub fn list_issues(&self) -> Result<Vec<Issue>> {
        let sql = format!("SELECT {} FROM issues ORDER BY id DESC", ISSUE_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let issues = stmt
            .query_map([], issue_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(issues)
    }

    pub fn list_by_department(&self, department: &str) -> Result<Vec<Issue>> {
        let sql = format!(
            "SELECT {} FROM issues WHERE department = ?1 ORDER BY id DESC",
            ISSUE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let issues = stmt
            .query_map([department], issue_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(issues)
    }

    /// Returns false when no issue has this id; the update is then a no-op.
    pub fn assign_department(&self, id: i64, department: &str) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE issues SET department = ?1 WHERE id = ?2",
            params![department, id],
        )?;
        Ok(rows > 0)
    }

    /// Returns false when no issue has this id; the update is then a no-op.
    pub fn update_status(&self, id: i64, status: &str) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE issues SET status = ?1 WHERE id = ?2",
            params![status, id],
        )?;
        Ok(rows > 0)
    }

    // Aggregates

    pub fn stats(&self) -> Result<Stats> {
        let (total, resolved): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN status = ?1 THEN 1 ELSE 0 END), 0) FROM issues",
            [STATUS_RESOLVED],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(Stats::from_counts(total, resolved))
    }

    pub fn category_counts(&self) -> Result<Vec<CategoryCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT category, COUNT(*) FROM issues GROUP BY category ORDER BY category",
        )?;
        let counts = stmt
            .query_map([], |row| {
                Ok(CategoryCount {
                    category: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(counts)
    }
}

fn issue_from_row(row: &Row<'_>) -> rusqlite::Result<Issue> {
    Ok(Issue {
        id: row.get(0)?,
        category: row.get(1)?,
        description: row.get(2)?,
        status: row.get(3)?,
        department: row.get(4)?,
        image_path: row.get(5)?,
    })
}
