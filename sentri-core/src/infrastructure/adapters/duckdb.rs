// sentri-core/src/infrastructure/adapters/duckdb.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use duckdb::{Config, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument};

use crate::domain::config::{RetryConfig, SourceConfig, SourceKind};
use crate::domain::dataset::Dataset;
use crate::error::SentriError;
use crate::infrastructure::adapters::retry::retry_with_backoff;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::connector::DataConnector;

/// Where the rows come from, as a DuckDB relation.
#[derive(Debug, Clone)]
enum Relation {
    /// A table function over a file (`read_csv(...)`, `read_parquet(...)`).
    File { path: String, scan: String },
    /// An arbitrary query against an attached database.
    Query(String),
}

/// Reads CSV, Parquet or DuckDB database sources through one embedded engine.
pub struct DuckDbConnector {
    conn: Arc<Mutex<Connection>>,
    relation: Relation,
    date_column: String,
    retry: RetryConfig,
    name: String,
}

impl DuckDbConnector {
    /// Builds the connector for `source`. `date_column` is used unless the
    /// source section overrides it.
    pub fn new(source: &SourceConfig, date_column: &str) -> Result<Self, InfrastructureError> {
        let missing = |section: &str| {
            InfrastructureError::ConfigError(format!(
                "'{section}' configuration required when type is '{section}'"
            ))
        };

        let (conn, relation) = match source.kind {
            SourceKind::Csv => {
                let csv = source.csv.as_ref().ok_or_else(|| missing("csv"))?;
                let scan = format!(
                    "read_csv('{}', delim = '{}', header = {})",
                    quote_literal(&csv.file_path),
                    quote_literal(&csv.delimiter),
                    csv.header
                );
                (
                    Connection::open_in_memory_with_flags(Config::default())?,
                    Relation::File {
                        path: csv.file_path.clone(),
                        scan,
                    },
                )
            }
            SourceKind::Parquet => {
                let pq = source.parquet.as_ref().ok_or_else(|| missing("parquet"))?;
                let scan = format!("read_parquet('{}')", quote_literal(&pq.file_path));
                (
                    Connection::open_in_memory_with_flags(Config::default())?,
                    Relation::File {
                        path: pq.file_path.clone(),
                        scan,
                    },
                )
            }
            SourceKind::Duckdb => {
                let db = source.duckdb.as_ref().ok_or_else(|| missing("duckdb"))?;
                let conn = if db.database == ":memory:" {
                    Connection::open_in_memory_with_flags(Config::default())?
                } else {
                    Connection::open_with_flags(&db.database, Config::default())?
                };
                (conn, Relation::Query(db.sql.trim().trim_end_matches(';').to_string()))
            }
        };

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            relation,
            date_column: source
                .date_column_override()
                .unwrap_or(date_column)
                .to_string(),
            retry: source.connection_retry.clone(),
            name: source.kind.to_string(),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SentriError> {
        self.conn.lock().map_err(|_| {
            SentriError::Infrastructure(InfrastructureError::Io(std::io::Error::other(
                "DuckDB Mutex Poisoned",
            )))
        })
    }

    fn from_clause(&self) -> String {
        match &self.relation {
            Relation::File { scan, .. } => scan.clone(),
            Relation::Query(sql) => format!("({sql}) AS src"),
        }
    }

    pub(crate) fn select_sql(&self, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "SELECT * FROM {} WHERE CAST({} AS DATE) BETWEEN DATE '{}' AND DATE '{}'",
            self.from_clause(),
            quote_ident(&self.date_column),
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        )
    }

    fn check_reachable(&self) -> Result<(), SentriError> {
        if let Relation::File { path, .. } = &self.relation
            && !Path::new(path).exists()
        {
            return Err(self.failure(format!("file '{path}' does not exist")));
        }
        let conn = self.lock()?;
        let sql = format!("SELECT * FROM {} LIMIT 0", self.from_clause());
        conn.prepare(&sql)
            .map(|_| ())
            .map_err(|e| InfrastructureError::from(e).into())
    }

    fn query(&self, sql: &str) -> Result<Dataset, SentriError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql).map_err(InfrastructureError::from)?;
        let arrow = stmt.query_arrow([]).map_err(InfrastructureError::from)?;
        let schema = arrow.get_schema();
        let batches: Vec<_> = arrow.collect();
        Ok(Dataset::from_batches(schema, &batches)?.to_lowercase_columns()?)
    }

    fn failure(&self, reason: String) -> SentriError {
        InfrastructureError::Connector {
            connector: self.name.clone(),
            reason,
        }
        .into()
    }
}

#[async_trait]
impl DataConnector for DuckDbConnector {
    async fn validate_connection(&self) -> Result<(), SentriError> {
        retry_with_backoff(&self.retry, "validate_connection", || async { self.check_reachable() }).await?;
        info!(connector = %self.name, "Connection validated");
        Ok(())
    }

    #[instrument(skip(self), fields(connector = %self.name))]
    async fn fetch(&self, start_date: NaiveDate, end_date: NaiveDate) -> Result<Dataset, SentriError> {
        let sql = self.select_sql(start_date, end_date);
        debug!(sql = %sql, "Fetching rows");
        let data = retry_with_backoff(&self.retry, "fetch", || async { self.query(&sql) }).await?;
        info!(rows = data.num_rows(), columns = data.column_names().len(), "Data fetched");
        Ok(data)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn quote_literal(s: &str) -> String {
    s.replace('\'', "''")
}

fn quote_ident(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}
