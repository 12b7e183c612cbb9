//! Best-effort extraction of account number, statement period, balances,
//! and company identity from a statement header. Every field is optional;
//! nothing here can fail the overall parse.

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::models::{AccountInfo, CompanyInfo, StatementPeriod};
use crate::text::parse_amount_cents;

/// How many leading lines the company-identity scan examines.
const COMPANY_SCAN_LINES: usize = 20;

struct HeaderPatterns {
    account_number: Regex,
    period_slash: Regex,
    period_long: Regex,
    beginning_balance: Regex,
    ending_balance: Regex,
    business_name: Regex,
    street: Regex,
    city_state_zip: Regex,
}

impl HeaderPatterns {
    fn new() -> Self {
        Self {
            account_number: Regex::new(r"(?i)account number:?\s*([\d][\d \-]{6,18}\d)").unwrap(),
            period_slash: Regex::new(
                r"(\d{1,2}/\d{1,2}/\d{2,4})\s*(?:through|thru|-)\s*(\d{1,2}/\d{1,2}/\d{2,4})",
            )
            .unwrap(),
            period_long: Regex::new(
                r"(?i)((?:january|february|march|april|may|june|july|august|september|october|november|december)\s+\d{1,2},\s+\d{4})\s+through\s+((?:january|february|march|april|may|june|july|august|september|october|november|december)\s+\d{1,2},\s+\d{4})",
            )
            .unwrap(),
            beginning_balance: Regex::new(r"(?i)beginning balance\s*\$?([\d,]+\.\d{2})").unwrap(),
            ending_balance: Regex::new(r"(?i)ending balance\s*\$?([\d,]+\.\d{2})").unwrap(),
            business_name: Regex::new(
                r"(?i)^[A-Z0-9][A-Za-z0-9&.,' \-]*\b(?:LLC|INC|CORP|CORPORATION|CO|COMPANY|LTD|LLP)\.?$",
            )
            .unwrap(),
            street: Regex::new(
                r"(?i)^\d+\s+[A-Za-z0-9 .]+\b(?:street|st|avenue|ave|road|rd|boulevard|blvd|drive|dr|lane|ln|way|suite|ste)\b",
            )
            .unwrap(),
            city_state_zip: Regex::new(r"^[A-Za-z .]+,?\s+[A-Z]{2}\s+\d{5}(?:-\d{4})?$").unwrap(),
        }
    }
}

fn parse_mdy(raw: &str) -> Option<NaiveDate> {
    let mut it = raw.trim().split('/');
    let m: u32 = it.next()?.parse().ok()?;
    let d: u32 = it.next()?.parse().ok()?;
    let mut y: i32 = it.next()?.parse().ok()?;
    if y < 100 {
        y += 2000;
    }
    NaiveDate::from_ymd_opt(y, m, d)
}

fn parse_long_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%B %d, %Y")
        .or_else(|_| NaiveDate::parse_from_str(&raw.trim().to_lowercase(), "%B %d, %Y"))
        .ok()
}

fn extract_period(text: &str, pats: &HeaderPatterns) -> Option<StatementPeriod> {
    if let Some(caps) = pats.period_slash.captures(text) {
        let start = parse_mdy(&caps[1])?;
        let end = parse_mdy(&caps[2])?;
        return Some(StatementPeriod { start, end });
    }
    if let Some(caps) = pats.period_long.captures(text) {
        let start = parse_long_date(&caps[1])?;
        let end = parse_long_date(&caps[2])?;
        return Some(StatementPeriod { start, end });
    }
    None
}

fn is_boilerplate(line: &str) -> bool {
    let upper = line.to_uppercase();
    ["ACCOUNT", "STATEMENT", "BALANCE", "PAGE", "PERIOD", "CUSTOMER SERVICE", "P.O. BOX", "PO BOX"]
        .iter()
        .any(|m| upper.contains(m))
}

fn extract_company(text: &str, pats: &HeaderPatterns) -> CompanyInfo {
    let mut company = CompanyInfo::default();
    for line in text.lines().take(COMPANY_SCAN_LINES) {
        let line = line.trim();
        if line.is_empty() || is_boilerplate(line) {
            continue;
        }
        if company.name.is_none() && pats.business_name.is_match(line) {
            company.name = Some(line.to_string());
        } else if company.address.is_none()
            && (pats.street.is_match(line) || pats.city_state_zip.is_match(line))
        {
            company.address = Some(line.to_string());
        }
        if company.name.is_some() && company.address.is_some() {
            break;
        }
    }
    company
}

/// Single-pass header extraction. Absent fields stay `None`.
pub fn extract_account_info(text: &str) -> AccountInfo {
    let pats = HeaderPatterns::new();
    let account_number = pats
        .account_number
        .captures(text)
        .map(|c| c[1].chars().filter(|ch| ch.is_ascii_digit()).collect());
    let period = extract_period(text, &pats);
    let beginning_balance_cents = pats
        .beginning_balance
        .captures(text)
        .and_then(|c| parse_amount_cents(&c[1]));
    let ending_balance_cents = pats
        .ending_balance
        .captures(text)
        .and_then(|c| parse_amount_cents(&c[1]));
    let company = extract_company(text, &pats);

    AccountInfo {
        account_number,
        period,
        beginning_balance_cents,
        ending_balance_cents,
        company,
    }
}

/// Year used to resolve `MM/DD` transaction dates: the period's end year,
/// falling back to the current calendar year when no period was found.
///
/// Known ambiguity inherited from the statement layout: a December-to-January
/// statement resolves December dates into the end year.
pub fn infer_year(period: Option<&StatementPeriod>) -> i32 {
    match period {
        Some(p) => p.end.year(),
        None => chrono::Local::now().year(),
    }
}
