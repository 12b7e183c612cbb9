//! Fixed accounting-category vocabulary and the built-in keyword tables the
//! classifier falls back on when no user rule resolves a transaction.

use crate::models::TxnType;

/// (name, type) for every category a rule or classification may target.
pub const CATEGORIES: &[(&str, TxnType)] = &[
    // Income
    ("Gross Receipts", TxnType::Income),
    ("Interest Income", TxnType::Income),
    ("Other Income", TxnType::Income),
    // Expenses
    ("Advertising", TxnType::Expense),
    ("Bank Charges", TxnType::Expense),
    ("Car and Truck Expenses", TxnType::Expense),
    ("Commissions and Fees", TxnType::Expense),
    ("Contract Labor", TxnType::Expense),
    ("Insurance", TxnType::Expense),
    ("Legal and Professional Services", TxnType::Expense),
    ("Meals and Entertainment", TxnType::Expense),
    ("Office Expense", TxnType::Expense),
    ("Rent or Lease", TxnType::Expense),
    ("Repairs and Maintenance", TxnType::Expense),
    ("Software and Subscriptions", TxnType::Expense),
    ("Supplies", TxnType::Expense),
    ("Taxes and Licenses", TxnType::Expense),
    ("Travel", TxnType::Expense),
    ("Utilities", TxnType::Expense),
    ("Other Expenses", TxnType::Expense),
];

/// Offered alongside an "uncategorized" decision so the review UI always has
/// something to show.
pub const COMMON_CATEGORIES: &[&str] = &[
    "Office Expense",
    "Meals and Entertainment",
    "Car and Truck Expenses",
    "Supplies",
];

pub fn is_known_category(name: &str) -> bool {
    CATEGORIES.iter().any(|(n, _)| *n == name)
}

pub fn category_type(name: &str) -> Option<TxnType> {
    CATEGORIES.iter().find(|(n, _)| *n == name).map(|(_, t)| *t)
}

const BUILTIN_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Car and Truck Expenses",
        &[
            "shell", "chevron", "exxon", "mobil", "valero", "gas station", "fuel", "autozone",
            "jiffy lube", "car wash", "parking", "toll",
        ],
    ),
    (
        "Meals and Entertainment",
        &[
            "restaurant", "cafe", "coffee", "starbucks", "mcdonald", "chipotle", "doordash",
            "grubhub", "pizza", "deli", "catering",
        ],
    ),
    (
        "Office Expense",
        &["office depot", "staples", "officemax", "usps", "fedex", "ups store"],
    ),
    (
        "Supplies",
        &["home depot", "lowes", "walmart", "target", "costco", "amazon"],
    ),
    (
        "Software and Subscriptions",
        &[
            "adobe", "microsoft", "google", "zoom", "dropbox", "github", "slack", "intuit",
            "quickbooks",
        ],
    ),
    (
        "Utilities",
        &["electric", "power co", "water dept", "internet", "comcast", "verizon", "at&t", "utility"],
    ),
    (
        "Travel",
        &[
            "airline", "hotel", "marriott", "hilton", "delta air", "united air", "southwest",
            "airbnb", "uber", "lyft", "rental car",
        ],
    ),
    (
        "Insurance",
        &["insurance", "geico", "state farm", "allstate", "progressive"],
    ),
    (
        "Advertising",
        &["facebook ads", "google ads", "adwords", "mailchimp", "marketing"],
    ),
    (
        "Legal and Professional Services",
        &["attorney", "legal", "cpa", "accounting", "notary", "consulting"],
    ),
    ("Rent or Lease", &["rent", "lease", "property mgmt", "wework"]),
    (
        "Bank Charges",
        &["service fee", "overdraft", "monthly fee", "wire fee", "atm fee"],
    ),
    (
        "Taxes and Licenses",
        &["irs", "tax payment", "dept of revenue", "franchise tax", "license"],
    ),
    ("Contract Labor", &["upwork", "fiverr", "contractor"]),
    (
        "Gross Receipts",
        &["stripe", "square inc", "paypal transfer", "invoice", "client payment", "remote deposit"],
    ),
    ("Interest Income", &["interest payment", "interest credit"]),
];

/// Immutable keyword table handed to the classifier at call time, so tests
/// can swap in their own sets.
pub struct KeywordTable {
    entries: Vec<(String, Vec<String>)>,
}

impl KeywordTable {
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN_KEYWORDS
                .iter()
                .map(|(cat, kws)| {
                    (cat.to_string(), kws.iter().map(|k| k.to_string()).collect())
                })
                .collect(),
        }
    }

    pub fn new(entries: Vec<(String, Vec<String>)>) -> Self {
        Self { entries }
    }

    /// First (category, keyword) whose keyword occurs in `text` (lowercased).
    pub fn find_match(&self, text: &str) -> Option<(&str, &str)> {
        let lower = text.to_lowercase();
        if lower.is_empty() {
            return None;
        }
        for (cat, kws) in &self.entries {
            if let Some(kw) = kws.iter().find(|kw| lower.contains(kw.as_str())) {
                return Some((cat.as_str(), kw.as_str()));
            }
        }
        None
    }
}
