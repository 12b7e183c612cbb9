use std::path::Path;

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::Connection;

use crate::error::{Result, TellerError};
use crate::models::{Rule, SectionTag, Transaction, TxnType};

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    user_id TEXT NOT NULL,
    date TEXT NOT NULL,
    description TEXT NOT NULL,
    payee TEXT NOT NULL DEFAULT '',
    amount_cents INTEGER NOT NULL,
    txn_type TEXT NOT NULL,
    category TEXT,
    section TEXT NOT NULL DEFAULT 'uncategorized',
    confidence REAL NOT NULL DEFAULT 0,
    needs_review INTEGER NOT NULL DEFAULT 0,
    is_manually_reviewed INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_transactions_user_date ON transactions(user_id, date);

CREATE TABLE IF NOT EXISTS rules (
    id INTEGER PRIMARY KEY,
    user_id TEXT NOT NULL,
    keywords TEXT NOT NULL DEFAULT '[]',
    payee_contains TEXT NOT NULL DEFAULT '[]',
    description_contains TEXT NOT NULL DEFAULT '[]',
    amount_min_cents INTEGER,
    amount_max_cents INTEGER,
    target_category TEXT NOT NULL,
    target_type TEXT NOT NULL,
    confidence REAL NOT NULL DEFAULT 0.7,
    training_count INTEGER NOT NULL DEFAULT 0,
    success_rate REAL NOT NULL DEFAULT 1.0,
    is_system_generated INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS statements (
    id INTEGER PRIMARY KEY,
    user_id TEXT NOT NULL,
    filename TEXT NOT NULL,
    checksum TEXT NOT NULL,
    record_count INTEGER,
    period_start TEXT,
    period_end TEXT,
    imported_at TEXT DEFAULT (datetime('now'))
);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn conversion_err(idx: usize, e: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn txn_from_row(row: &rusqlite::Row) -> rusqlite::Result<Transaction> {
    let date_str: String = row.get(1)?;
    let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| conversion_err(1, e))?;
    let type_code: String = row.get(5)?;
    let txn_type = TxnType::from_code(&type_code).ok_or_else(|| {
        conversion_err(5, std::io::Error::new(std::io::ErrorKind::InvalidData, type_code.clone()))
    })?;
    let section_code: String = row.get(7)?;
    Ok(Transaction {
        id: Some(row.get(0)?),
        date,
        description: row.get(2)?,
        payee: row.get(3)?,
        amount_cents: row.get(4)?,
        txn_type,
        category: row.get(6)?,
        section: SectionTag::from_code(&section_code),
        confidence: row.get(8)?,
        needs_review: row.get::<_, i64>(9)? != 0,
        is_manually_reviewed: row.get::<_, i64>(10)? != 0,
    })
}

const TXN_COLUMNS: &str = "id, date, description, payee, amount_cents, txn_type, category, \
                           section, confidence, needs_review, is_manually_reviewed";

fn rule_from_row(row: &rusqlite::Row) -> rusqlite::Result<Rule> {
    let parse_list = |idx: usize, raw: String| -> rusqlite::Result<Vec<String>> {
        serde_json::from_str(&raw).map_err(|e| conversion_err(idx, e))
    };
    let type_code: String = row.get(9)?;
    let target_type = TxnType::from_code(&type_code).ok_or_else(|| {
        conversion_err(9, std::io::Error::new(std::io::ErrorKind::InvalidData, type_code.clone()))
    })?;
    Ok(Rule {
        id: Some(row.get(0)?),
        user_id: row.get(1)?,
        keywords: parse_list(2, row.get(2)?)?,
        payee_contains: parse_list(3, row.get(3)?)?,
        description_contains: parse_list(4, row.get(4)?)?,
        amount_min_cents: row.get(5)?,
        amount_max_cents: row.get(6)?,
        target_category: row.get(7)?,
        confidence: row.get(8)?,
        target_type,
        training_count: row.get(10)?,
        success_rate: row.get(11)?,
        is_system_generated: row.get::<_, i64>(12)? != 0,
    })
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

pub fn get_rules(conn: &Connection, user_id: &str) -> Result<Vec<Rule>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, keywords, payee_contains, description_contains, \
         amount_min_cents, amount_max_cents, target_category, confidence, target_type, \
         training_count, success_rate, is_system_generated \
         FROM rules WHERE user_id = ?1 ORDER BY id",
    )?;
    let rules = stmt
        .query_map([user_id], rule_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rules)
}

pub fn create_rule(conn: &Connection, rule: &Rule) -> Result<i64> {
    conn.execute(
        "INSERT INTO rules (user_id, keywords, payee_contains, description_contains, \
         amount_min_cents, amount_max_cents, target_category, target_type, confidence, \
         training_count, success_rate, is_system_generated) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        rusqlite::params![
            rule.user_id,
            serde_json::to_string(&rule.keywords)?,
            serde_json::to_string(&rule.payee_contains)?,
            serde_json::to_string(&rule.description_contains)?,
            rule.amount_min_cents,
            rule.amount_max_cents,
            rule.target_category,
            rule.target_type.code(),
            rule.confidence,
            rule.training_count,
            rule.success_rate,
            rule.is_system_generated as i64,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_rule(conn: &Connection, rule: &Rule) -> Result<()> {
    let id = rule
        .id
        .ok_or_else(|| TellerError::Other("cannot update a rule without an id".to_string()))?;
    conn.execute(
        "UPDATE rules SET keywords = ?1, payee_contains = ?2, description_contains = ?3, \
         amount_min_cents = ?4, amount_max_cents = ?5, target_category = ?6, target_type = ?7, \
         confidence = ?8, training_count = ?9, success_rate = ?10, is_system_generated = ?11 \
         WHERE id = ?12",
        rusqlite::params![
            serde_json::to_string(&rule.keywords)?,
            serde_json::to_string(&rule.payee_contains)?,
            serde_json::to_string(&rule.description_contains)?,
            rule.amount_min_cents,
            rule.amount_max_cents,
            rule.target_category,
            rule.target_type.code(),
            rule.confidence,
            rule.training_count,
            rule.success_rate,
            rule.is_system_generated as i64,
            id,
        ],
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

pub struct InsertCounts {
    pub inserted: usize,
    pub skipped: usize,
}

fn is_duplicate_row(conn: &Connection, user_id: &str, txn: &Transaction) -> Result<bool> {
    let mut stmt = conn.prepare_cached(
        "SELECT 1 FROM transactions \
         WHERE user_id = ?1 AND date = ?2 AND amount_cents = ?3 AND description = ?4",
    )?;
    Ok(stmt.exists(rusqlite::params![
        user_id,
        txn.date.format("%Y-%m-%d").to_string(),
        txn.amount_cents,
        txn.description,
    ])?)
}

/// Insert a parsed batch, skipping rows already present for this user on the
/// (date, amount, description) key.
pub fn insert_transactions(
    conn: &Connection,
    user_id: &str,
    transactions: &[Transaction],
) -> Result<InsertCounts> {
    let mut counts = InsertCounts {
        inserted: 0,
        skipped: 0,
    };
    for txn in transactions {
        if is_duplicate_row(conn, user_id, txn)? {
            counts.skipped += 1;
            continue;
        }
        conn.execute(
            "INSERT INTO transactions (user_id, date, description, payee, amount_cents, \
             txn_type, category, section, confidence, needs_review, is_manually_reviewed) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params![
                user_id,
                txn.date.format("%Y-%m-%d").to_string(),
                txn.description,
                txn.payee,
                txn.amount_cents,
                txn.txn_type.code(),
                txn.category,
                txn.section.code(),
                txn.confidence,
                txn.needs_review as i64,
                txn.is_manually_reviewed as i64,
            ],
        )?;
        counts.inserted += 1;
    }
    Ok(counts)
}

pub fn get_transactions(conn: &Connection, user_id: &str) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TXN_COLUMNS} FROM transactions WHERE user_id = ?1 ORDER BY date, id"
    ))?;
    let txns = stmt
        .query_map([user_id], txn_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(txns)
}

pub fn get_transaction(conn: &Connection, user_id: &str, txn_id: i64) -> Result<Transaction> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TXN_COLUMNS} FROM transactions WHERE user_id = ?1 AND id = ?2"
    ))?;
    let mut rows = stmt.query_map(rusqlite::params![user_id, txn_id], txn_from_row)?;
    match rows.next() {
        Some(row) => Ok(row?),
        None => Err(TellerError::UnknownTransaction(txn_id)),
    }
}

pub fn get_uncategorized(conn: &Connection, user_id: &str) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TXN_COLUMNS} FROM transactions \
         WHERE user_id = ?1 AND category IS NULL ORDER BY date, id"
    ))?;
    let txns = stmt
        .query_map([user_id], txn_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(txns)
}

/// Recent history for the classifier's precedent vote, newest first, capped.
pub fn get_history(conn: &Connection, user_id: &str, limit: usize) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TXN_COLUMNS} FROM transactions \
         WHERE user_id = ?1 ORDER BY date DESC, id DESC LIMIT ?2"
    ))?;
    let txns = stmt
        .query_map(rusqlite::params![user_id, limit as i64], txn_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(txns)
}

pub fn update_classification(
    conn: &Connection,
    user_id: &str,
    txn_id: i64,
    category: Option<&str>,
    confidence: f64,
    needs_review: bool,
) -> Result<()> {
    conn.execute(
        "UPDATE transactions SET category = ?1, confidence = ?2, needs_review = ?3 \
         WHERE id = ?4 AND user_id = ?5",
        rusqlite::params![category, confidence, needs_review as i64, txn_id, user_id],
    )?;
    Ok(())
}

/// Record a human decision: assign the category and mark the row reviewed.
pub fn mark_reviewed(conn: &Connection, user_id: &str, txn_id: i64, category: &str) -> Result<()> {
    let changed = conn.execute(
        "UPDATE transactions SET category = ?1, confidence = 1.0, needs_review = 0, \
         is_manually_reviewed = 1 WHERE id = ?2 AND user_id = ?3",
        rusqlite::params![category, txn_id, user_id],
    )?;
    if changed == 0 {
        return Err(TellerError::UnknownTransaction(txn_id));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Statement uploads
// ---------------------------------------------------------------------------

pub fn statement_is_imported(conn: &Connection, user_id: &str, checksum: &str) -> Result<bool> {
    let mut stmt =
        conn.prepare("SELECT 1 FROM statements WHERE user_id = ?1 AND checksum = ?2")?;
    Ok(stmt.exists(rusqlite::params![user_id, checksum])?)
}

pub fn record_statement(
    conn: &Connection,
    user_id: &str,
    filename: &str,
    checksum: &str,
    record_count: usize,
    period: Option<(&NaiveDate, &NaiveDate)>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO statements (user_id, filename, checksum, record_count, period_start, period_end) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            user_id,
            filename,
            checksum,
            record_count as i64,
            period.map(|(s, _)| s.format("%Y-%m-%d").to_string()),
            period.map(|(_, e)| e.format("%Y-%m-%d").to_string()),
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SectionTag;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn sample_txn(day: u32, desc: &str) -> Transaction {
        Transaction::draft(
            NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            desc.to_string(),
            "Shell Oil".to_string(),
            4_500,
            TxnType::Expense,
            SectionTag::CardWithdrawals,
        )
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["transactions", "rules", "statements"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
    }

    #[test]
    fn test_transaction_roundtrip() {
        let (_dir, conn) = test_db();
        let mut txn = sample_txn(15, "Card Purchase Shell Oil Card 1234");
        txn.category = Some("Car and Truck Expenses".to_string());
        txn.confidence = 0.7;
        insert_transactions(&conn, "u1", &[txn]).unwrap();

        let stored = get_transactions(&conn, "u1").unwrap();
        assert_eq!(stored.len(), 1);
        let t = &stored[0];
        assert_eq!(t.date, NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
        assert_eq!(t.amount_cents, 4_500);
        assert_eq!(t.txn_type, TxnType::Expense);
        assert_eq!(t.section, SectionTag::CardWithdrawals);
        assert_eq!(t.category.as_deref(), Some("Car and Truck Expenses"));
        assert!(!t.is_manually_reviewed);
    }

    #[test]
    fn test_insert_skips_duplicate_rows() {
        let (_dir, conn) = test_db();
        let txn = sample_txn(15, "Card Purchase Shell Oil Card 1234");
        let first = insert_transactions(&conn, "u1", &[txn.clone()]).unwrap();
        assert_eq!(first.inserted, 1);
        let second = insert_transactions(&conn, "u1", &[txn]).unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped, 1);
    }

    #[test]
    fn test_transactions_are_scoped_by_user() {
        let (_dir, conn) = test_db();
        insert_transactions(&conn, "u1", &[sample_txn(15, "one")]).unwrap();
        insert_transactions(&conn, "u2", &[sample_txn(16, "two")]).unwrap();
        assert_eq!(get_transactions(&conn, "u1").unwrap().len(), 1);
        assert_eq!(get_transactions(&conn, "u2").unwrap().len(), 1);
    }

    #[test]
    fn test_rule_roundtrip_with_keyword_lists() {
        let (_dir, conn) = test_db();
        let rule = Rule {
            id: None,
            user_id: "u1".to_string(),
            keywords: vec!["shell gas".to_string()],
            payee_contains: vec!["shell".to_string()],
            description_contains: vec!["fuel".to_string()],
            amount_min_cents: Some(1_000),
            amount_max_cents: None,
            target_category: "Car and Truck Expenses".to_string(),
            target_type: TxnType::Expense,
            confidence: 0.7,
            training_count: 2,
            success_rate: 1.0,
            is_system_generated: true,
        };
        let id = create_rule(&conn, &rule).unwrap();
        let stored = get_rules(&conn, "u1").unwrap();
        assert_eq!(stored.len(), 1);
        let r = &stored[0];
        assert_eq!(r.id, Some(id));
        assert_eq!(r.keywords, vec!["shell gas".to_string()]);
        assert_eq!(r.payee_contains, vec!["shell".to_string()]);
        assert_eq!(r.amount_min_cents, Some(1_000));
        assert!(r.is_system_generated);
    }

    #[test]
    fn test_update_rule_requires_id() {
        let (_dir, conn) = test_db();
        let mut rule = Rule {
            id: None,
            user_id: "u1".to_string(),
            keywords: Vec::new(),
            payee_contains: Vec::new(),
            description_contains: Vec::new(),
            amount_min_cents: None,
            amount_max_cents: None,
            target_category: "Travel".to_string(),
            target_type: TxnType::Expense,
            confidence: 0.7,
            training_count: 0,
            success_rate: 1.0,
            is_system_generated: false,
        };
        assert!(update_rule(&conn, &rule).is_err());
        rule.id = Some(create_rule(&conn, &rule).unwrap());
        rule.confidence = 0.75;
        update_rule(&conn, &rule).unwrap();
        let stored = get_rules(&conn, "u1").unwrap();
        assert!((stored[0].confidence - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_history_is_capped() {
        let (_dir, conn) = test_db();
        let txns: Vec<Transaction> = (1..=20)
            .map(|d| sample_txn(d, &format!("txn {d}")))
            .collect();
        insert_transactions(&conn, "u1", &txns).unwrap();
        let history = get_history(&conn, "u1", 5).unwrap();
        assert_eq!(history.len(), 5);
        // Newest first.
        assert_eq!(history[0].date, NaiveDate::from_ymd_opt(2025, 1, 20).unwrap());
    }

    #[test]
    fn test_update_classification_is_scoped_by_user() {
        let (_dir, conn) = test_db();
        insert_transactions(&conn, "u1", &[sample_txn(15, "one")]).unwrap();
        let id = get_transactions(&conn, "u1").unwrap()[0].id.unwrap();

        update_classification(&conn, "u2", id, Some("Travel"), 0.7, false).unwrap();
        assert!(get_transactions(&conn, "u1").unwrap()[0].category.is_none());

        update_classification(&conn, "u1", id, Some("Travel"), 0.7, false).unwrap();
        let t = &get_transactions(&conn, "u1").unwrap()[0];
        assert_eq!(t.category.as_deref(), Some("Travel"));
        assert!((t.confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_mark_reviewed() {
        let (_dir, conn) = test_db();
        insert_transactions(&conn, "u1", &[sample_txn(15, "one")]).unwrap();
        let id = get_transactions(&conn, "u1").unwrap()[0].id.unwrap();
        mark_reviewed(&conn, "u1", id, "Car and Truck Expenses").unwrap();
        let t = &get_transactions(&conn, "u1").unwrap()[0];
        assert!(t.is_manually_reviewed);
        assert!(!t.needs_review);
        assert_eq!(t.category.as_deref(), Some("Car and Truck Expenses"));
        assert!(mark_reviewed(&conn, "u1", 9999, "Travel").is_err());
    }

    #[test]
    fn test_statement_checksum_guard() {
        let (_dir, conn) = test_db();
        assert!(!statement_is_imported(&conn, "u1", "abc123").unwrap());
        record_statement(&conn, "u1", "jan.txt", "abc123", 12, None).unwrap();
        assert!(statement_is_imported(&conn, "u1", "abc123").unwrap());
        assert!(!statement_is_imported(&conn, "u2", "abc123").unwrap());
    }
}
