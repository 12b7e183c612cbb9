use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Direction of a transaction, fixed by the section it was recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxnType {
    Income,
    Expense,
}

impl TxnType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }
}

/// Provenance tag: which extraction path produced a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionTag {
    Deposits,
    ChecksPaid,
    CardWithdrawals,
    ElectronicWithdrawals,
    FallbackScan,
    Manual,
    Uncategorized,
}

impl SectionTag {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Deposits => "deposits",
            Self::ChecksPaid => "checks_paid",
            Self::CardWithdrawals => "card_withdrawals",
            Self::ElectronicWithdrawals => "electronic_withdrawals",
            Self::FallbackScan => "fallback_scan",
            Self::Manual => "manual",
            Self::Uncategorized => "uncategorized",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Deposits => "Deposits and Additions",
            Self::ChecksPaid => "Checks Paid",
            Self::CardWithdrawals => "ATM & Debit Card Withdrawals",
            Self::ElectronicWithdrawals => "Electronic Withdrawals",
            Self::FallbackScan => "Fallback Scan",
            Self::Manual => "Manual Entry",
            Self::Uncategorized => "Uncategorized Section",
        }
    }

    pub fn from_code(code: &str) -> Self {
        match code {
            "deposits" => Self::Deposits,
            "checks_paid" => Self::ChecksPaid,
            "card_withdrawals" => Self::CardWithdrawals,
            "electronic_withdrawals" => Self::ElectronicWithdrawals,
            "fallback_scan" => Self::FallbackScan,
            "manual" => Self::Manual,
            _ => Self::Uncategorized,
        }
    }
}

/// A recovered transaction. Amounts are integer cents, always positive;
/// direction lives in `txn_type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Option<i64>,
    pub date: NaiveDate,
    pub description: String,
    pub payee: String,
    pub amount_cents: i64,
    pub txn_type: TxnType,
    pub category: Option<String>,
    pub section: SectionTag,
    pub confidence: f64,
    pub needs_review: bool,
    pub is_manually_reviewed: bool,
}

impl Transaction {
    pub fn draft(
        date: NaiveDate,
        description: String,
        payee: String,
        amount_cents: i64,
        txn_type: TxnType,
        section: SectionTag,
    ) -> Self {
        let needs_review = payee.is_empty();
        Self {
            id: None,
            date,
            description,
            payee,
            amount_cents,
            txn_type,
            category: None,
            section,
            confidence: 0.0,
            needs_review,
            is_manually_reviewed: false,
        }
    }

    /// Review flag invariant: uncategorized or payee-less records need a human.
    pub fn refresh_needs_review(&mut self) {
        self.needs_review = self.category.is_none() || self.payee.is_empty();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub name: Option<String>,
    pub address: Option<String>,
}

impl CompanyInfo {
    pub fn extracted(&self) -> bool {
        self.name.is_some() || self.address.is_some()
    }
}

/// Header fields recovered from the top of a statement. All best-effort;
/// a missing field never fails the parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountInfo {
    pub account_number: Option<String>,
    pub period: Option<StatementPeriod>,
    pub beginning_balance_cents: Option<i64>,
    pub ending_balance_cents: Option<i64>,
    pub company: CompanyInfo,
}

/// A user- or trainer-authored classification rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: Option<i64>,
    pub user_id: String,
    pub keywords: Vec<String>,
    pub payee_contains: Vec<String>,
    pub description_contains: Vec<String>,
    pub amount_min_cents: Option<i64>,
    pub amount_max_cents: Option<i64>,
    pub target_category: String,
    pub target_type: TxnType,
    pub confidence: f64,
    pub training_count: i64,
    pub success_rate: f64,
    pub is_system_generated: bool,
}
