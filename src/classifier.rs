//! One-shot classification pipeline: user rules, then built-in keywords,
//! then historical precedent, combined into a single ranked decision.

use rusqlite::Connection;
use serde::Serialize;

use crate::db;
use crate::keywords::{KeywordTable, COMMON_CATEGORIES};
use crate::models::{Rule, Transaction};

/// A rule scoring above this wins outright and the remaining strategies are
/// skipped. Rationale: a trusted user rule resolves the case, so the cost of
/// a historical lookup buys nothing.
pub const RULE_SHORT_CIRCUIT_CONFIDENCE: f64 = 0.8;

/// Starting confidence for rules a user authors directly: strong enough to
/// dominate keyword and history votes, still below 1.0.
pub const MANUAL_RULE_CONFIDENCE: f64 = 0.85;

const WEIGHT_PAYEE: f64 = 0.4;
const WEIGHT_DESCRIPTION: f64 = 0.3;
const WEIGHT_AMOUNT: f64 = 0.2;

const KEYWORD_PAYEE_CONFIDENCE: f64 = 0.7;
const KEYWORD_DESCRIPTION_CONFIDENCE: f64 = 0.5;

const HISTORY_MAX_CONFIDENCE: f64 = 0.8;

/// Confidence reported when nothing matched at all.
const UNCATEGORIZED_CONFIDENCE: f64 = 0.1;

/// Amount heuristics: a cheap card swipe at a coffee shop is a meal; a large
/// "equipment" purchase is a deductible expense.
const SMALL_AMOUNT_CENTS: i64 = 2_000;
const LARGE_AMOUNT_CENTS: i64 = 50_000;
const COFFEE_HINTS: &[&str] = &["coffee", "cafe", "espresso", "roaster"];

const MAX_SUGGESTIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Rule,
    Keyword,
    History,
    Default,
}

impl Method {
    fn rank(&self) -> u8 {
        match self {
            Self::Rule => 0,
            Self::Keyword => 1,
            Self::History => 2,
            Self::Default => 3,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Suggestion {
    pub category: String,
    pub confidence: f64,
    pub method: Method,
}

#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub category: Option<String>,
    pub confidence: f64,
    pub method: Method,
    pub rule_id: Option<i64>,
    pub matched_keywords: Vec<String>,
    pub suggestions: Vec<Suggestion>,
}

impl Classification {
    fn uncategorized() -> Self {
        Self {
            category: None,
            confidence: UNCATEGORIZED_CONFIDENCE,
            method: Method::Default,
            rule_id: None,
            matched_keywords: Vec::new(),
            suggestions: COMMON_CATEGORIES
                .iter()
                .map(|c| Suggestion {
                    category: c.to_string(),
                    confidence: UNCATEGORIZED_CONFIDENCE,
                    method: Method::Default,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    category: String,
    confidence: f64,
    method: Method,
    rule_id: Option<i64>,
    matched_keywords: Vec<String>,
}

// ---------------------------------------------------------------------------
// Strategy 1: user rules
// ---------------------------------------------------------------------------

/// Score a rule against a transaction. The score is a weighted sum over the
/// criteria the rule defines (payee 0.4, description 0.3, amount range 0.2),
/// normalized by the defined weight so a fully-matched single-criterion rule
/// scores 1.0, then scaled by the rule's own confidence and success rate.
fn score_rule(rule: &Rule, txn: &Transaction) -> Option<(f64, Vec<String>)> {
    let payee = txn.payee.to_lowercase();
    let desc = txn.description.to_lowercase();
    let mut defined = 0.0;
    let mut score = 0.0;
    let mut matched = Vec::new();

    let payee_terms: Vec<&String> = rule.payee_contains.iter().chain(&rule.keywords).collect();
    if !payee_terms.is_empty() {
        defined += WEIGHT_PAYEE;
        if !payee.is_empty() {
            if let Some(term) = payee_terms.iter().find(|t| payee.contains(t.as_str())) {
                score += WEIGHT_PAYEE;
                matched.push(term.to_string());
            }
        }
    }

    let desc_terms: Vec<&String> = rule
        .description_contains
        .iter()
        .chain(&rule.keywords)
        .collect();
    if !desc_terms.is_empty() {
        defined += WEIGHT_DESCRIPTION;
        if let Some(term) = desc_terms.iter().find(|t| desc.contains(t.as_str())) {
            score += WEIGHT_DESCRIPTION;
            if !matched.contains(term) {
                matched.push(term.to_string());
            }
        }
    }

    if rule.amount_min_cents.is_some() || rule.amount_max_cents.is_some() {
        defined += WEIGHT_AMOUNT;
        let min_ok = rule.amount_min_cents.map_or(true, |m| txn.amount_cents >= m);
        let max_ok = rule.amount_max_cents.map_or(true, |m| txn.amount_cents <= m);
        if min_ok && max_ok {
            score += WEIGHT_AMOUNT;
        }
    }

    if defined == 0.0 || score == 0.0 {
        return None;
    }
    Some(((score / defined) * rule.confidence * rule.success_rate, matched))
}

fn best_rule_candidate(txn: &Transaction, rules: &[Rule]) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;
    for rule in rules {
        if rule.target_type != txn.txn_type {
            continue;
        }
        let Some((confidence, matched_keywords)) = score_rule(rule, txn) else {
            continue;
        };
        let better = match &best {
            None => true,
            Some(b) => confidence > b.confidence,
        };
        if better {
            best = Some(Candidate {
                category: rule.target_category.clone(),
                confidence,
                method: Method::Rule,
                rule_id: rule.id,
                matched_keywords,
            });
        }
    }
    best
}

// ---------------------------------------------------------------------------
// Strategy 2: built-in keywords
// ---------------------------------------------------------------------------

fn keyword_candidate(txn: &Transaction, table: &KeywordTable) -> Option<Candidate> {
    // A payee hit is stronger evidence than a hit buried in the description.
    if let Some((cat, kw)) = table.find_match(&txn.payee) {
        return Some(Candidate {
            category: cat.to_string(),
            confidence: KEYWORD_PAYEE_CONFIDENCE,
            method: Method::Keyword,
            rule_id: None,
            matched_keywords: vec![kw.to_string()],
        });
    }
    if let Some((cat, kw)) = table.find_match(&txn.description) {
        return Some(Candidate {
            category: cat.to_string(),
            confidence: KEYWORD_DESCRIPTION_CONFIDENCE,
            method: Method::Keyword,
            rule_id: None,
            matched_keywords: vec![kw.to_string()],
        });
    }
    amount_heuristic(txn)
}

fn amount_heuristic(txn: &Transaction) -> Option<Candidate> {
    let payee = txn.payee.to_lowercase();
    let desc = txn.description.to_lowercase();
    if txn.amount_cents <= SMALL_AMOUNT_CENTS {
        if let Some(hint) = COFFEE_HINTS.iter().find(|h| payee.contains(*h)) {
            return Some(Candidate {
                category: "Meals and Entertainment".to_string(),
                confidence: 0.6,
                method: Method::Keyword,
                rule_id: None,
                matched_keywords: vec![hint.to_string()],
            });
        }
    }
    if txn.amount_cents >= LARGE_AMOUNT_CENTS && desc.contains("equipment") {
        return Some(Candidate {
            category: "Other Expenses".to_string(),
            confidence: 0.55,
            method: Method::Keyword,
            rule_id: None,
            matched_keywords: vec!["equipment".to_string()],
        });
    }
    None
}

// ---------------------------------------------------------------------------
// Strategy 3: historical precedent
// ---------------------------------------------------------------------------

fn history_candidate(txn: &Transaction, history: &[Transaction]) -> Option<Candidate> {
    let payee = txn.payee.to_lowercase();
    if payee.is_empty() {
        return None;
    }
    let similar: Vec<&Transaction> = history
        .iter()
        .filter(|h| h.is_manually_reviewed && !h.payee.is_empty())
        .filter(|h| {
            let other = h.payee.to_lowercase();
            other.contains(&payee) || payee.contains(&other)
        })
        .collect();
    if similar.is_empty() {
        return None;
    }

    let mut tally: std::collections::BTreeMap<&str, usize> = std::collections::BTreeMap::new();
    for h in &similar {
        if let Some(cat) = h.category.as_deref() {
            *tally.entry(cat).or_default() += 1;
        }
    }
    // BTreeMap iteration makes the plurality tie-break alphabetical, so
    // repeated runs agree.
    let (category, count) = tally.into_iter().max_by_key(|(_, n)| *n)?;
    let confidence = (count as f64 / similar.len() as f64).min(HISTORY_MAX_CONFIDENCE);
    Some(Candidate {
        category: category.to_string(),
        confidence,
        method: Method::History,
        rule_id: None,
        matched_keywords: Vec::new(),
    })
}

// ---------------------------------------------------------------------------
// Combination
// ---------------------------------------------------------------------------

fn combine(mut candidates: Vec<Candidate>) -> Classification {
    candidates.retain(|c| c.confidence > 0.0);
    if candidates.is_empty() {
        return Classification::uncategorized();
    }
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.method.rank().cmp(&b.method.rank()))
            .then(a.category.cmp(&b.category))
    });
    let top = candidates.remove(0);
    let suggestions = candidates
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|c| Suggestion {
            category: c.category,
            confidence: c.confidence,
            method: c.method,
        })
        .collect();
    Classification {
        category: Some(top.category),
        confidence: top.confidence,
        method: top.method,
        rule_id: top.rule_id,
        matched_keywords: top.matched_keywords,
        suggestions,
    }
}

/// Classify one transaction against an in-memory rule set, keyword table,
/// and history slice. Deterministic for identical inputs.
pub fn classify(
    txn: &Transaction,
    rules: &[Rule],
    history: &[Transaction],
    table: &KeywordTable,
) -> Classification {
    let rule_candidate = best_rule_candidate(txn, rules);
    if let Some(c) = &rule_candidate {
        if c.confidence > RULE_SHORT_CIRCUIT_CONFIDENCE {
            return Classification {
                category: Some(c.category.clone()),
                confidence: c.confidence,
                method: Method::Rule,
                rule_id: c.rule_id,
                matched_keywords: c.matched_keywords.clone(),
                suggestions: Vec::new(),
            };
        }
    }

    let mut candidates = Vec::new();
    candidates.extend(rule_candidate);
    candidates.extend(keyword_candidate(txn, table));
    candidates.extend(history_candidate(txn, history));
    combine(candidates)
}

/// Store-backed classification. A failing rule or history lookup downgrades
/// this one transaction to an uncategorized, needs-review result; it never
/// aborts the rest of the batch.
pub fn classify_stored(
    conn: &Connection,
    user_id: &str,
    txn: &Transaction,
    table: &KeywordTable,
    history_limit: usize,
) -> Classification {
    let looked_up = db::get_rules(conn, user_id)
        .and_then(|rules| db::get_history(conn, user_id, history_limit).map(|h| (rules, h)));
    match looked_up {
        Ok((rules, history)) => classify(txn, &rules, &history, table),
        Err(_) => Classification::uncategorized(),
    }
}

/// Apply a classification decision back onto a transaction draft.
pub fn apply(txn: &mut Transaction, decision: &Classification) {
    txn.category = decision.category.clone();
    txn.confidence = decision.confidence;
    txn.refresh_needs_review();
}
