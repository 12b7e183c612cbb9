//! Locates the four labeled transaction sections inside raw statement text.
//!
//! Each section runs from a header anchor ("DEPOSITS AND ADDITIONS") to its
//! matching total line ("Total Deposits and Additions"). A missing section is
//! not an error; callers get `None` and extract zero transactions from it.

use crate::models::{SectionTag, TxnType};

pub struct SectionSpec {
    pub tag: SectionTag,
    pub txn_type: TxnType,
    /// Uppercase header anchor.
    pub header: &'static str,
    /// Uppercase total-line anchor ending the section.
    pub footer: &'static str,
}

pub const SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        tag: SectionTag::Deposits,
        txn_type: TxnType::Income,
        header: "DEPOSITS AND ADDITIONS",
        footer: "TOTAL DEPOSITS AND ADDITIONS",
    },
    SectionSpec {
        tag: SectionTag::ChecksPaid,
        txn_type: TxnType::Expense,
        header: "CHECKS PAID",
        footer: "TOTAL CHECKS PAID",
    },
    SectionSpec {
        tag: SectionTag::CardWithdrawals,
        txn_type: TxnType::Expense,
        header: "ATM & DEBIT CARD WITHDRAWALS",
        footer: "TOTAL ATM & DEBIT CARD WITHDRAWALS",
    },
    SectionSpec {
        tag: SectionTag::ElectronicWithdrawals,
        txn_type: TxnType::Expense,
        header: "ELECTRONIC WITHDRAWALS",
        footer: "TOTAL ELECTRONIC WITHDRAWALS",
    },
];

fn is_any_header(upper: &str) -> bool {
    !upper.contains("TOTAL") && SECTIONS.iter().any(|s| upper.contains(s.header))
}

/// Return the text between the first occurrence of the section's header and
/// its total line. Tolerates a missing total line by stopping at the next
/// section header (or end of document). Returns `None` when the header is
/// absent entirely.
pub fn extract_section(text: &str, spec: &SectionSpec) -> Option<String> {
    let mut lines = text.lines();
    // Total lines repeat the header phrase; skip them while hunting the header.
    lines.find(|line| {
        let upper = line.to_uppercase();
        upper.contains(spec.header) && !upper.contains("TOTAL")
    })?;

    let mut body = Vec::new();
    for line in lines {
        let upper = line.to_uppercase();
        if upper.contains(spec.footer) || is_any_header(&upper) {
            break;
        }
        body.push(line);
    }
    Some(body.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_for(tag: SectionTag) -> &'static SectionSpec {
        SECTIONS.iter().find(|s| s.tag == tag).unwrap()
    }

    #[test]
    fn test_extracts_between_anchors() {
        let text = "\
DEPOSITS AND ADDITIONS
01/05 Deposit 1 $500.00
01/15 Deposit 2 $1,000.00
Total Deposits and Additions $1,500.00
CHECKS PAID
1042 ^ 01/20 $75.00
Total Checks Paid $75.00
";
        let body = extract_section(text, spec_for(SectionTag::Deposits)).unwrap();
        assert_eq!(body.lines().count(), 2);
        assert!(body.contains("Deposit 2"));
        assert!(!body.contains("Total Deposits"));
        assert!(!body.contains("CHECKS PAID"));
    }

    #[test]
    fn test_absent_section_returns_none() {
        let text = "DEPOSITS AND ADDITIONS\n01/05 Deposit $10.00\nTotal Deposits and Additions\n";
        assert!(extract_section(text, spec_for(SectionTag::ChecksPaid)).is_none());
    }

    #[test]
    fn test_missing_footer_stops_at_next_header() {
        let text = "\
ELECTRONIC WITHDRAWALS
01/07 Orig CO Name:Acme Payroll $2,400.00
DEPOSITS AND ADDITIONS
01/09 Deposit $50.00
";
        let body = extract_section(text, spec_for(SectionTag::ElectronicWithdrawals)).unwrap();
        assert!(body.contains("Acme Payroll"));
        assert!(!body.contains("Deposit $50.00"));
    }

    #[test]
    fn test_duplicate_headers_first_span_wins() {
        let text = "\
CHECKS PAID
1042 ^ 01/20 $75.00
Total Checks Paid $75.00
CHECKS PAID
1043 ^ 01/22 $80.00
Total Checks Paid $80.00
";
        let body = extract_section(text, spec_for(SectionTag::ChecksPaid)).unwrap();
        assert!(body.contains("1042"));
        assert!(!body.contains("1043"));
    }

    #[test]
    fn test_card_header_not_confused_with_its_total() {
        let text = "\
Total ATM & Debit Card Withdrawals $12.00
ATM & DEBIT CARD WITHDRAWALS
01/04 Card Purchase Shell Oil 1234 $45.00
Total ATM & Debit Card Withdrawals $45.00
";
        let body = extract_section(text, spec_for(SectionTag::CardWithdrawals)).unwrap();
        assert!(body.contains("Shell Oil"));
        assert!(!body.to_uppercase().contains("TOTAL"));
    }
}
