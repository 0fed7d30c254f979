//! The four fixed analytical queries over the analytical store.
//!
//! Each query is a pure function of the store contents. Results carry fixed
//! column sets and orderings so the plotting side can rely on them.

use crate::error::{Result, ResultExt};
use crate::store::AnalyticalStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

const SINGLE_PARENT_HIGH_INCOME: &str = r#"
    SELECT COUNT(*),
           100 * COUNT(*) / (SELECT COUNT(*) FROM customers)
    FROM customers
    WHERE gender = 'female'
      AND family_size = 1
      AND annual_income > 15000
"#;

const MALE_ENGINEER_EXPERIENCE: &str = r#"
    SELECT AVG(work_experience)
    FROM customers
    WHERE profession = 'engineer' AND gender = 'male'
"#;

const LAWYERS_ABOVE_BASELINE: &str = r#"
    SELECT COUNT(*)
    FROM customers
    WHERE profession = 'lawyer'
      AND work_experience > (
          SELECT AVG(work_experience)
          FROM customers
          WHERE profession = 'engineer' AND gender = 'male'
      )
"#;

const LAWYER_SPENDING_BANDS: &str = r#"
    SELECT gender,
           CASE
               WHEN spending_score <= 20 THEN 1
               WHEN spending_score <= 40 THEN 2
               WHEN spending_score <= 60 THEN 3
               WHEN spending_score <= 80 THEN 4
               ELSE 5
           END AS band,
           COUNT(*)
    FROM customers
    WHERE profession = 'lawyer'
      AND spending_score BETWEEN 0 AND 100
    GROUP BY gender, band
    ORDER BY gender, band
"#;

const PROFESSION_AVERAGES: &str = r#"
    SELECT profession, ROUND(AVG(spending_score), 2) AS avg_spending_score
    FROM customers
    GROUP BY profession
    ORDER BY avg_spending_score DESC, profession ASC
"#;

const PROFESSION_SCORES: &str = r#"
    SELECT profession, spending_score
    FROM customers
    WHERE spending_score IS NOT NULL
    ORDER BY rowid
"#;

/// Q1 result: women in single-person households earning over 15000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleParentHighIncome {
    pub count: i64,
    /// `100 * count / total`, truncated; 0 for an empty store
    pub percentage: i64,
}

/// Q2 result: lawyers whose experience exceeds the male-engineer average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LawyerExperience {
    pub count: i64,
    /// Average experience of male engineers; `None` when there are none
    pub engineer_baseline: Option<f64>,
}

/// Inclusive spending-score bands used by Q3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpendingBand {
    #[serde(rename = "0-20")]
    UpTo20,
    #[serde(rename = "21-40")]
    UpTo40,
    #[serde(rename = "41-60")]
    UpTo60,
    #[serde(rename = "61-80")]
    UpTo80,
    #[serde(rename = "81-100")]
    UpTo100,
}

impl SpendingBand {
    pub const ALL: [SpendingBand; 5] = [
        Self::UpTo20,
        Self::UpTo40,
        Self::UpTo60,
        Self::UpTo80,
        Self::UpTo100,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::UpTo20 => "0-20",
            Self::UpTo40 => "21-40",
            Self::UpTo60 => "41-60",
            Self::UpTo80 => "61-80",
            Self::UpTo100 => "81-100",
        }
    }

    fn from_rank(rank: i64) -> Option<Self> {
        usize::try_from(rank - 1)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
    }
}

impl fmt::Display for SpendingBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One Q3 row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendingBandCount {
    pub gender: Option<String>,
    pub band: SpendingBand,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfessionAverage {
    pub profession: String,
    /// Rounded to two decimals; `None` if no row of the profession has a score
    pub avg_spending_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfessionScore {
    pub profession: String,
    pub spending_score: f64,
}

/// Q4 result: per-profession averages plus the raw pairs behind them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfessionSpending {
    /// Ordered by average descending, then profession
    pub averages: Vec<ProfessionAverage>,
    /// In table order
    pub scores: Vec<ProfessionScore>,
}

/// All four query results of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySetReport {
    pub single_parent_high_income: SingleParentHighIncome,
    pub lawyers_above_engineer_baseline: LawyerExperience,
    pub lawyer_spending_bands: Vec<SpendingBandCount>,
    pub profession_spending: ProfessionSpending,
}

/// Q1: count and share of women with family size 1 and income above 15000.
pub fn run_query_1(store: &AnalyticalStore) -> Result<SingleParentHighIncome> {
    let (count, percentage) = store
        .connection()
        .query_row(SINGLE_PARENT_HIGH_INCOME, [], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, Option<i64>>(1)?))
        })
        .context("Q1 failed")?;

    debug!("Q1: count={}, percentage={:?}", count, percentage);
    Ok(SingleParentHighIncome {
        count,
        percentage: percentage.unwrap_or(0),
    })
}

/// Q2: lawyers with more experience than the average male engineer.
pub fn run_query_2(store: &AnalyticalStore) -> Result<LawyerExperience> {
    let conn = store.connection();
    let engineer_baseline: Option<f64> = conn
        .query_row(MALE_ENGINEER_EXPERIENCE, [], |row| row.get(0))
        .context("Q2 baseline failed")?;
    let count: i64 = conn
        .query_row(LAWYERS_ABOVE_BASELINE, [], |row| row.get(0))
        .context("Q2 failed")?;

    debug!("Q2: count={}, baseline={:?}", count, engineer_baseline);
    Ok(LawyerExperience {
        count,
        engineer_baseline,
    })
}

/// Q3: lawyer counts per `(gender, spending band)`, ordered by gender then band.
pub fn run_query_3(store: &AnalyticalStore) -> Result<Vec<SpendingBandCount>> {
    let mut stmt = store.connection().prepare(LAWYER_SPENDING_BANDS)?;
    let mut rows = stmt.query([])?;

    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        let rank: i64 = row.get(1)?;
        // The CASE expression only yields ranks 1..=5.
        let Some(band) = SpendingBand::from_rank(rank) else {
            continue;
        };
        result.push(SpendingBandCount {
            gender: row.get(0)?,
            band,
            count: row.get(2)?,
        });
    }

    debug!("Q3: {} rows", result.len());
    Ok(result)
}

/// Q4: average spending score per profession plus raw `(profession, score)` pairs.
pub fn run_query_4(store: &AnalyticalStore) -> Result<ProfessionSpending> {
    let conn = store.connection();

    let mut stmt = conn.prepare(PROFESSION_AVERAGES)?;
    let averages = stmt
        .query_map([], |row| {
            Ok(ProfessionAverage {
                profession: row.get(0)?,
                avg_spending_score: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Q4 averages failed")?;

    let mut stmt = conn.prepare(PROFESSION_SCORES)?;
    let scores = stmt
        .query_map([], |row| {
            Ok(ProfessionScore {
                profession: row.get(0)?,
                spending_score: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Q4 scores failed")?;

    debug!("Q4: {} professions, {} scores", averages.len(), scores.len());
    Ok(ProfessionSpending { averages, scores })
}

/// Run all four queries in order.
pub fn run_all(store: &AnalyticalStore) -> Result<QuerySetReport> {
    Ok(QuerySetReport {
        single_parent_high_income: run_query_1(store)?,
        lawyers_above_engineer_baseline: run_query_2(store)?,
        lawyer_spending_bands: run_query_3(store)?,
        profession_spending: run_query_4(store)?,
    })
}
