use crate::{
    bindings::Output,
    config::DbConfig,
    data::student::StudentRecord,
    error::{InvalidTableNameSnafu, MakeQuerySnafu, MigrateSnafu, OpenDatabaseSnafu, RosterResult},
};
use async_trait::async_trait;
use snafu::ResultExt;
use sqlx::{Pool, Postgres, postgres::PgPoolOptions};
use std::fmt;

/// A `table` or `schema.table` name made only of plain identifiers, safe to splice into SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName(String);

impl TableName {
    pub fn parse(raw: &str) -> RosterResult<Self> {
        let raw = raw.trim();
        let parts: Vec<&str> = raw.split('.').collect();

        snafu::ensure!(
            (1..=2).contains(&parts.len()) && parts.iter().all(|part| is_identifier(part)),
            InvalidTableNameSnafu { table: raw }
        );

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn insert_statement(&self) -> String {
        format!("INSERT INTO {} (name, grade) VALUES ($1, $2)", self.0)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Writes each student as one row of the configured table.
#[derive(Debug, Clone)]
pub struct SqlOutput {
    pool: Pool<Postgres>,
    insert_statement: String,
}

impl SqlOutput {
    /// Connections are only opened on first use, so an unreachable database fails inserts, not startup.
    pub fn new(options: PgPoolOptions, config: &DbConfig) -> RosterResult<Self> {
        let pool = options
            .connect_lazy(&config.get_db_path())
            .context(OpenDatabaseSnafu)?;

        Ok(Self::from_pool(pool, config.table()))
    }

    pub fn from_pool(pool: Pool<Postgres>, table: &TableName) -> Self {
        Self {
            pool,
            insert_statement: table.insert_statement(),
        }
    }

    pub async fn migrate(&self) -> RosterResult<()> {
        sqlx::migrate!().run(&self.pool).await.context(MigrateSnafu)
    }
}

#[async_trait]
impl Output<StudentRecord> for SqlOutput {
    async fn set(&self, value: StudentRecord) -> RosterResult<()> {
        sqlx::query(&self.insert_statement)
            .bind(&value.name)
            .bind(value.grade)
            .execute(&self.pool)
            .await
            .context(MakeQuerySnafu)?;

        debug!(?value, "inserted student");
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
