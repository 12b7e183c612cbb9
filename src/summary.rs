//! Pure aggregation over a transaction list. All accumulation is integer
//! cents; dollars appear only when a presentation layer formats them.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{Transaction, TxnType};

/// Display bucket for records with no category assigned.
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total_cents: i64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionTotal {
    pub section: String,
    pub label: String,
    pub total_cents: i64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub transaction_count: usize,
    pub total_income_cents: i64,
    pub total_expenses_cents: i64,
    pub net_income_cents: i64,
    pub categories: Vec<CategoryTotal>,
    pub sections: Vec<SectionTotal>,
    pub needs_review_count: usize,
}

pub fn summarize(transactions: &[Transaction]) -> Summary {
    let mut total_income = 0i64;
    let mut total_expenses = 0i64;
    let mut needs_review = 0usize;
    let mut by_category: BTreeMap<String, (i64, usize)> = BTreeMap::new();
    let mut by_section: BTreeMap<&'static str, (i64, usize)> = BTreeMap::new();

    for txn in transactions {
        match txn.txn_type {
            TxnType::Income => total_income += txn.amount_cents,
            TxnType::Expense => total_expenses += txn.amount_cents,
        }
        if txn.needs_review {
            needs_review += 1;
        }
        let cat = txn.category.as_deref().unwrap_or(UNCATEGORIZED);
        let entry = by_category.entry(cat.to_string()).or_insert((0, 0));
        entry.0 += txn.amount_cents;
        entry.1 += 1;

        let entry = by_section.entry(txn.section.code()).or_insert((0, 0));
        entry.0 += txn.amount_cents;
        entry.1 += 1;
    }

    let categories = by_category
        .into_iter()
        .map(|(category, (total_cents, count))| CategoryTotal {
            category,
            total_cents,
            count,
        })
        .collect();
    let sections = by_section
        .into_iter()
        .map(|(code, (total_cents, count))| SectionTotal {
            section: code.to_string(),
            label: crate::models::SectionTag::from_code(code).label().to_string(),
            total_cents,
            count,
        })
        .collect();

    Summary {
        transaction_count: transactions.len(),
        total_income_cents: total_income,
        total_expenses_cents: total_expenses,
        net_income_cents: total_income - total_expenses,
        categories,
        sections,
        needs_review_count: needs_review,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SectionTag;
    use chrono::NaiveDate;

    fn txn(day: u32, cents: i64, t: TxnType, cat: Option<&str>, section: SectionTag) -> Transaction {
        let mut txn = Transaction::draft(
            NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            format!("txn {day}"),
            "Payee".to_string(),
            cents,
            t,
            section,
        );
        txn.category = cat.map(|c| c.to_string());
        txn.refresh_needs_review();
        txn
    }

    #[test]
    fn test_empty_list_is_all_zero() {
        let s = summarize(&[]);
        assert_eq!(s.transaction_count, 0);
        assert_eq!(s.total_income_cents, 0);
        assert_eq!(s.total_expenses_cents, 0);
        assert_eq!(s.net_income_cents, 0);
        assert!(s.categories.is_empty());
        assert_eq!(s.needs_review_count, 0);
    }

    #[test]
    fn test_totals_and_net() {
        let txns = vec![
            txn(5, 50_000, TxnType::Income, Some("Gross Receipts"), SectionTag::Deposits),
            txn(6, 20_000, TxnType::Expense, Some("Travel"), SectionTag::CardWithdrawals),
            txn(7, 5_000, TxnType::Expense, None, SectionTag::ChecksPaid),
        ];
        let s = summarize(&txns);
        assert_eq!(s.total_income_cents, 50_000);
        assert_eq!(s.total_expenses_cents, 25_000);
        assert_eq!(s.net_income_cents, 25_000);
        assert_eq!(s.needs_review_count, 1);
        let uncategorized = s.categories.iter().find(|c| c.category == UNCATEGORIZED).unwrap();
        assert_eq!(uncategorized.total_cents, 5_000);
    }

    #[test]
    fn test_category_totals_reconcile_with_grand_totals() {
        // Category totals must sum to income + expenses, even at volume.
        let mut txns = Vec::new();
        for i in 0..120u32 {
            let day = 1 + (i % 28);
            let t = if i % 3 == 0 { TxnType::Income } else { TxnType::Expense };
            let section = if i % 3 == 0 { SectionTag::Deposits } else { SectionTag::CardWithdrawals };
            let cat = match i % 4 {
                0 => Some("Gross Receipts"),
                1 => Some("Supplies"),
                2 => None,
                _ => Some("Travel"),
            };
            txns.push(txn(day, 999 + i as i64 * 7, t, cat, section));
        }
        let s = summarize(&txns);
        let cat_sum: i64 = s.categories.iter().map(|c| c.total_cents).sum();
        assert_eq!(cat_sum, s.total_income_cents + s.total_expenses_cents);
        assert_eq!(s.net_income_cents, s.total_income_cents - s.total_expenses_cents);
        let sec_sum: i64 = s.sections.iter().map(|c| c.total_cents).sum();
        assert_eq!(sec_sum, cat_sum);
    }

    #[test]
    fn test_uncategorized_section_bucket() {
        let t = txn(3, 1_000, TxnType::Expense, Some("Supplies"), SectionTag::Uncategorized);
        let s = summarize(&[t]);
        assert_eq!(s.sections.len(), 1);
        assert_eq!(s.sections[0].section, "uncategorized");
        assert_eq!(s.sections[0].label, "Uncategorized Section");
    }
}
