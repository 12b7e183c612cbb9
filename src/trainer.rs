//! Promotes repeated manual corrections into reusable classification rules.
//!
//! Training is an explicit, user-triggered batch action: store failures
//! propagate instead of being downgraded, so a partial write can never
//! silently corrupt the rule set.

use std::collections::BTreeMap;

use rusqlite::Connection;
use serde::Serialize;

use crate::db;
use crate::error::Result;
use crate::models::{Rule, Transaction};

/// A payee→category pair must recur this often before it becomes a rule.
const MIN_GROUP_SIZE: usize = 2;

const NEW_RULE_CONFIDENCE: f64 = 0.7;
const CONFIDENCE_INCREMENT: f64 = 0.05;
/// Trained confidence never reaches the short-circuit band on its own.
const MAX_TRAINED_CONFIDENCE: f64 = 0.9;

#[derive(Debug, Clone, Default, Serialize)]
pub struct TrainReport {
    pub rules_created: usize,
    pub rules_updated: usize,
    pub transactions_processed: usize,
    pub payees_analyzed: usize,
}

fn rule_for_pair<'a>(rules: &'a mut [Rule], payee: &str, category: &str) -> Option<&'a mut Rule> {
    rules.iter_mut().find(|r| {
        r.target_category == category
            && (r.keywords.iter().any(|k| k == payee)
                || r.payee_contains.iter().any(|k| k == payee))
    })
}

/// Scan manually-reviewed, categorized transactions and create or strengthen
/// rules for recurring payee→category pairs.
pub fn train(conn: &Connection, user_id: &str, transactions: &[Transaction]) -> Result<TrainReport> {
    let eligible: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.is_manually_reviewed && t.category.is_some())
        .collect();

    let mut by_payee: BTreeMap<String, Vec<&Transaction>> = BTreeMap::new();
    for t in &eligible {
        let payee = t.payee.trim().to_lowercase();
        if payee.is_empty() {
            continue;
        }
        by_payee.entry(payee).or_default().push(t);
    }

    let mut rules = db::get_rules(conn, user_id)?;
    let mut report = TrainReport {
        transactions_processed: eligible.len(),
        payees_analyzed: by_payee.len(),
        ..Default::default()
    };

    for (payee, group) in &by_payee {
        let mut by_category: BTreeMap<&str, Vec<&Transaction>> = BTreeMap::new();
        for t in group {
            if let Some(cat) = t.category.as_deref() {
                by_category.entry(cat).or_default().push(t);
            }
        }
        for (category, members) in by_category {
            if members.len() < MIN_GROUP_SIZE {
                continue;
            }
            let observed_rate = members.len() as f64 / group.len() as f64;
            match rule_for_pair(&mut rules, payee, category) {
                Some(rule) => {
                    rule.training_count += members.len() as i64;
                    rule.success_rate = rule.success_rate.max(observed_rate);
                    rule.confidence =
                        (rule.confidence + CONFIDENCE_INCREMENT).min(MAX_TRAINED_CONFIDENCE);
                    db::update_rule(conn, rule)?;
                    report.rules_updated += 1;
                }
                None => {
                    let mut rule = Rule {
                        id: None,
                        user_id: user_id.to_string(),
                        keywords: vec![payee.clone()],
                        payee_contains: Vec::new(),
                        description_contains: Vec::new(),
                        amount_min_cents: None,
                        amount_max_cents: None,
                        target_category: category.to_string(),
                        target_type: members[0].txn_type,
                        confidence: NEW_RULE_CONFIDENCE,
                        training_count: members.len() as i64,
                        success_rate: 1.0,
                        is_system_generated: true,
                    };
                    rule.id = Some(db::create_rule(conn, &rule)?);
                    rules.push(rule);
                    report.rules_created += 1;
                }
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db};
    use crate::models::{SectionTag, TxnType};
    use chrono::NaiveDate;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn reviewed(payee: &str, category: &str) -> Transaction {
        let mut t = Transaction::draft(
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            format!("Card Purchase {payee}"),
            payee.to_string(),
            4_500,
            TxnType::Expense,
            SectionTag::CardWithdrawals,
        );
        t.category = Some(category.to_string());
        t.is_manually_reviewed = true;
        t
    }

    #[test]
    fn test_recurring_pair_creates_one_rule() {
        let (_dir, conn) = test_db();
        let txns = vec![
            reviewed("Shell Gas", "Car and Truck Expenses"),
            reviewed("Shell Gas", "Car and Truck Expenses"),
        ];
        let report = train(&conn, "u1", &txns).unwrap();
        assert_eq!(report.rules_created, 1);
        assert_eq!(report.rules_updated, 0);
        assert_eq!(report.transactions_processed, 2);
        assert_eq!(report.payees_analyzed, 1);

        let rules = db::get_rules(&conn, "u1").unwrap();
        assert_eq!(rules.len(), 1);
        let r = &rules[0];
        assert_eq!(r.training_count, 2);
        assert_eq!(r.keywords, vec!["shell gas".to_string()]);
        assert_eq!(r.target_category, "Car and Truck Expenses");
        assert!(r.is_system_generated);
        assert!((r.confidence - NEW_RULE_CONFIDENCE).abs() < 1e-9);
        assert!((r.success_rate - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_second_pass_strengthens_instead_of_duplicating() {
        let (_dir, conn) = test_db();
        let txns = vec![
            reviewed("Shell Gas", "Car and Truck Expenses"),
            reviewed("Shell Gas", "Car and Truck Expenses"),
        ];
        train(&conn, "u1", &txns).unwrap();
        let report = train(&conn, "u1", &txns).unwrap();
        assert_eq!(report.rules_created, 0);
        assert_eq!(report.rules_updated, 1);

        let rules = db::get_rules(&conn, "u1").unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].training_count, 4);
        assert!((rules[0].confidence - (NEW_RULE_CONFIDENCE + CONFIDENCE_INCREMENT)).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_capped_at_ceiling() {
        let (_dir, conn) = test_db();
        let txns = vec![
            reviewed("Shell Gas", "Car and Truck Expenses"),
            reviewed("Shell Gas", "Car and Truck Expenses"),
        ];
        for _ in 0..10 {
            train(&conn, "u1", &txns).unwrap();
        }
        let rules = db::get_rules(&conn, "u1").unwrap();
        assert!(rules[0].confidence <= MAX_TRAINED_CONFIDENCE + 1e-9);
    }

    #[test]
    fn test_single_occurrence_is_not_promoted() {
        let (_dir, conn) = test_db();
        let txns = vec![reviewed("Shell Gas", "Car and Truck Expenses")];
        let report = train(&conn, "u1", &txns).unwrap();
        assert_eq!(report.rules_created, 0);
        assert!(db::get_rules(&conn, "u1").unwrap().is_empty());
    }

    #[test]
    fn test_unreviewed_and_uncategorized_are_ignored() {
        let (_dir, conn) = test_db();
        let mut a = reviewed("Shell Gas", "Car and Truck Expenses");
        a.is_manually_reviewed = false;
        let mut b = reviewed("Shell Gas", "Car and Truck Expenses");
        b.category = None;
        let report = train(&conn, "u1", &[a, b]).unwrap();
        assert_eq!(report.transactions_processed, 0);
        assert_eq!(report.rules_created, 0);
    }

    #[test]
    fn test_payee_normalization_merges_case_variants() {
        let (_dir, conn) = test_db();
        let txns = vec![
            reviewed("Shell Gas", "Car and Truck Expenses"),
            reviewed("SHELL GAS", "Car and Truck Expenses"),
        ];
        let report = train(&conn, "u1", &txns).unwrap();
        assert_eq!(report.rules_created, 1);
        assert_eq!(report.payees_analyzed, 1);
    }

    #[test]
    fn test_store_failure_propagates() {
        let (_dir, conn) = test_db();
        conn.execute("DROP TABLE rules", []).unwrap();
        let txns = vec![
            reviewed("Shell Gas", "Car and Truck Expenses"),
            reviewed("Shell Gas", "Car and Truck Expenses"),
        ];
        assert!(train(&conn, "u1", &txns).is_err());
    }
}
