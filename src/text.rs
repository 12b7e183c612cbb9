//! Date, amount, and payee normalization shared by every extraction pass.

use chrono::NaiveDate;

/// Upper bound for a plausible statement amount: $1,000,000.00.
/// Anything above this is extraction noise, not money.
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000;

/// Longest payee string we keep; statements pad descriptions with IDs.
const MAX_PAYEE_LEN: usize = 60;

/// Card-purchase merchant names are truncated to this many words.
const MAX_MERCHANT_WORDS: usize = 4;

const NOISE_WORDS: &[&str] = &["DEBIT", "CREDIT", "CHECK", "DEPOSIT", "WITHDRAWAL", "PURCHASE"];

/// Parse a `MM/DD` token against an inferred statement year.
/// Returns `None` for month/day values outside a real calendar date.
pub fn parse_statement_date(token: &str, year: i32) -> Option<NaiveDate> {
    let token = token.trim();
    let (m, d) = token.split_once('/')?;
    let month: u32 = m.parse().ok()?;
    let day: u32 = d.parse().ok()?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Re-render a date in the statement's `MM/DD` form.
pub fn format_mm_dd(date: NaiveDate) -> String {
    date.format("%m/%d").to_string()
}

/// Parse a `$1,234.56`-style string into positive integer cents.
///
/// Rejects (returns `None` for) negatives, zero, values over
/// [`MAX_AMOUNT_CENTS`], and anything that is not a plain decimal after
/// stripping `$`, `,`, and surrounding quotes.
pub fn parse_amount_cents(raw: &str) -> Option<i64> {
    let s = raw.trim().trim_matches('"').replace(['$', ','], "");
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let (dollars, cents) = match s.split_once('.') {
        Some((d, c)) => (d, c),
        None => (s, ""),
    };
    if dollars.is_empty() || !dollars.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if cents.len() > 2 || !cents.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let dollars: i64 = dollars.parse().ok()?;
    let cents: i64 = match cents.len() {
        0 => 0,
        1 => cents.parse::<i64>().ok()? * 10,
        _ => cents.parse().ok()?,
    };
    let total = dollars.checked_mul(100)?.checked_add(cents)?;
    if total <= 0 || total > MAX_AMOUNT_CENTS {
        return None;
    }
    Some(total)
}

/// Collapse runs of whitespace into single spaces.
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_short_date(token: &str) -> bool {
    let Some((m, d)) = token.split_once('/') else {
        return false;
    };
    (1..=2).contains(&m.len())
        && (1..=2).contains(&d.len())
        && m.bytes().all(|b| b.is_ascii_digit())
        && d.bytes().all(|b| b.is_ascii_digit())
}

fn is_noise_word(token: &str) -> bool {
    NOISE_WORDS.iter().any(|w| token.eq_ignore_ascii_case(w))
}

fn is_numeric_id(token: &str) -> bool {
    token.len() >= 3 && token.bytes().all(|b| b.is_ascii_digit())
}

/// Strip transaction-code noise from a raw line and keep the subject.
/// Returns an empty string (never a placeholder) when nothing survives.
pub fn clean_payee(raw: &str) -> String {
    let mut words: Vec<&str> = raw.split_whitespace().collect();
    while let Some(first) = words.first() {
        if is_noise_word(first) || is_numeric_id(first) {
            words.remove(0);
        } else {
            break;
        }
    }
    while let Some(last) = words.last() {
        if is_noise_word(last) || is_short_date(last) || is_numeric_id(last) {
            words.pop();
        } else {
            break;
        }
    }
    let joined = words.join(" ");
    truncate_chars(&joined, MAX_PAYEE_LEN)
}

fn is_state_code(token: &str) -> bool {
    token.len() == 2 && token.bytes().all(|b| b.is_ascii_uppercase())
}

/// Reduce a card-purchase merchant string: drop trailing store IDs and
/// state codes, then cap the word count.
pub fn clean_merchant(raw: &str) -> String {
    let mut words: Vec<&str> = raw.split_whitespace().collect();
    while let Some(last) = words.last() {
        if is_numeric_id(last) || is_state_code(last) || last.starts_with('#') {
            words.pop();
        } else {
            break;
        }
    }
    words.truncate(MAX_MERCHANT_WORDS);
    clean_payee(&words.join(" "))
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.trim().to_string();
    }
    let cut: String = s.chars().take(max).collect();
    cut.trim_end().to_string()
}
