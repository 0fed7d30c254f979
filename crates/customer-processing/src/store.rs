//! Run-scoped analytical store over the cleaned table.
//!
//! The cleaned table is copied into an in-memory SQLite database with a
//! single `customers` table. After loading, the connection is switched to
//! `query_only`, so the store is read-only for the rest of its life. The
//! database is closed when the store is dropped.

use crate::error::{Result, ResultExt};
use crate::types::CleanedTable;
use rusqlite::{Connection, params};
use tracing::info;

/// Name of the single table holding the cleaned customers.
pub const CUSTOMERS_TABLE: &str = "customers";

const CREATE_CUSTOMERS: &str = r#"
    CREATE TABLE customers (
        customer_id     TEXT NOT NULL,
        gender          TEXT,
        age             REAL NOT NULL,
        annual_income   REAL,
        spending_score  REAL,
        profession      TEXT NOT NULL,
        work_experience REAL,
        family_size     INTEGER
    );
"#;

const INSERT_CUSTOMER: &str = "INSERT INTO customers (
        customer_id, gender, age, annual_income, spending_score,
        profession, work_experience, family_size
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

pub struct AnalyticalStore {
    conn: Connection,
    row_count: usize,
}

impl AnalyticalStore {
    /// Build a store from a cleaned table.
    pub fn load(table: &CleanedTable) -> Result<Self> {
        let mut conn = Connection::open_in_memory().context("Failed to open in-memory store")?;
        conn.execute_batch(CREATE_CUSTOMERS)
            .context("Failed to create customers table")?;

        let records = table.records()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(INSERT_CUSTOMER)?;
            for record in &records {
                stmt.execute(params![
                    record.customer_id,
                    record.gender,
                    record.age,
                    record.annual_income,
                    record.spending_score,
                    record.profession,
                    record.work_experience,
                    record.family_size,
                ])?;
            }
        }
        tx.commit().context("Failed to commit customer rows")?;

        conn.execute_batch("PRAGMA query_only = ON;")?;

        info!("Loaded {} rows into '{}'", records.len(), CUSTOMERS_TABLE);
        Ok(Self {
            conn,
            row_count: records.len(),
        })
    }

    /// Number of rows loaded.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}
