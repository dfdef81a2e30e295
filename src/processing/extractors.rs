// Label fill-in for identity fields the MRZ did not provide.
use chrono::NaiveDate;
use log::debug;

use crate::models::countries::classify_citizenship;
use crate::models::{DocumentType, ScanText, Strategy};
use crate::processing::dates::parse_document_date;
use crate::processing::labels::{find_by_labels, LabelMatch};

const PASSPORT_NUMBER_LABELS: &[&str] = &["passport no", "passport number", "no. pasport", "no pasport"];
const LICENSE_NUMBER_LABELS: &[&str] = &["license no", "licence no", "license number", "licence number", "dl no", "no. lesen"];
const ID_CARD_NUMBER_LABELS: &[&str] = &["identity card no", "id no", "id number", "nric", "ic no", "no. kp", "card no"];
const DOCUMENT_NUMBER_LABELS: &[&str] = &["document no", "document number", "doc no"];

const PASSPORT_NAME_LABELS: &[&str] = &["name of holder", "full name", "surname"];
const LICENSE_NAME_LABELS: &[&str] = &["full name", "name"];
const ID_CARD_NAME_LABELS: &[&str] = &["nama", "full name", "name"];
const NAME_LABELS: &[&str] = &["name", "nama"];

const NATIONALITY_LABELS: &[&str] = &["nationality", "citizenship", "warganegara", "kewarganegaraan"];
const ISSUANCE_LABELS: &[&str] = &["date of issue", "issue date", "date issued", "issued on", "tarikh dikeluarkan"];
const EXPIRY_LABELS: &[&str] = &[
    "date of expiry",
    "expiry date",
    "expiration date",
    "valid until",
    "expires",
    "tarikh tamat",
];
const CITIZEN_KEYWORDS: &[&str] = &["citizen", "citizenship", "nationality", "warganegara"];

/// Type-specific synonyms first, then the generic ones, without repeats.
fn ordered_labels(specific: &[&'static str], generic: &[&'static str]) -> Vec<&'static str> {
    let mut labels: Vec<&'static str> = specific.to_vec();
    for label in generic {
        if !labels.contains(label) {
            labels.push(label);
        }
    }
    labels
}

pub fn document_number_labels(document_type: DocumentType) -> Vec<&'static str> {
    let (first, second, third) = match document_type {
        DocumentType::Passport => (PASSPORT_NUMBER_LABELS, ID_CARD_NUMBER_LABELS, LICENSE_NUMBER_LABELS),
        DocumentType::DriverLicense => (LICENSE_NUMBER_LABELS, ID_CARD_NUMBER_LABELS, PASSPORT_NUMBER_LABELS),
        DocumentType::IdCard => (ID_CARD_NUMBER_LABELS, PASSPORT_NUMBER_LABELS, LICENSE_NUMBER_LABELS),
    };
    let labels = ordered_labels(first, DOCUMENT_NUMBER_LABELS);
    let labels = ordered_labels(&labels, second);
    ordered_labels(&labels, third)
}

pub fn name_labels(document_type: DocumentType) -> Vec<&'static str> {
    let specific = match document_type {
        DocumentType::Passport => PASSPORT_NAME_LABELS,
        DocumentType::DriverLicense => LICENSE_NAME_LABELS,
        DocumentType::IdCard => ID_CARD_NAME_LABELS,
    };
    ordered_labels(specific, NAME_LABELS)
}

/// Upper-cased document number with hyphens and spaces removed, when it
/// is 5 to 15 alphanumeric characters. Falls back to the first token so a
/// value followed by other text on the same line still counts.
pub fn clean_document_number(value: &str) -> Option<String> {
    let accept = |text: &str| {
        let compact: String = text
            .chars()
            .filter(|c| *c != '-' && !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();
        let len = compact.chars().count();
        if (5..=15).contains(&len) && compact.chars().all(|c| c.is_ascii_alphanumeric()) {
            Some(compact)
        } else {
            None
        }
    };
    accept(value).or_else(|| value.split_whitespace().next().and_then(accept))
}

/// Whitespace-collapsed name with at least two letters and no digits.
pub fn clean_name(value: &str) -> Option<String> {
    let name = value
        .trim_matches(|c: char| !c.is_alphabetic())
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let letters = name.chars().filter(|c| c.is_alphabetic()).count();
    if letters >= 2 && !name.chars().any(|c| c.is_ascii_digit()) {
        Some(name)
    } else {
        None
    }
}

/// A nationality label value, mapped through the citizen table when it
/// names a known country and kept as written otherwise.
pub fn clean_nationality(value: &str) -> Option<String> {
    if let Some(country) = classify_citizenship(value) {
        return Some(country);
    }
    let word = value.split(|c: char| c == ',' || c == '/').next()?.trim();
    if word.chars().count() >= 3 && word.chars().all(|c| c.is_alphabetic() || c == ' ') {
        Some(word.to_string())
    } else {
        None
    }
}

pub struct IdentityLabelExtractor;

impl IdentityLabelExtractor {
    pub fn document_number(scan: &ScanText, document_type: DocumentType) -> Option<LabelMatch> {
        find_by_labels(&document_number_labels(document_type), scan, clean_document_number)
    }

    pub fn full_name(scan: &ScanText, document_type: DocumentType) -> Option<LabelMatch> {
        find_by_labels(&name_labels(document_type), scan, clean_name)
    }

    pub fn nationality(scan: &ScanText) -> Option<LabelMatch> {
        find_by_labels(NATIONALITY_LABELS, scan, clean_nationality)
    }

    pub fn issuance_date(scan: &ScanText) -> Option<LabelMatch<NaiveDate>> {
        find_by_labels(ISSUANCE_LABELS, scan, parse_document_date)
    }

    pub fn expiry_date(scan: &ScanText) -> Option<LabelMatch<NaiveDate>> {
        find_by_labels(EXPIRY_LABELS, scan, parse_document_date)
    }

    /// Nationality from a line that mentions citizenship and names a
    /// country from the closed table.
    pub fn citizen_keyword(scan: &ScanText) -> Option<String> {
        scan.lines
            .iter()
            .filter(|line| {
                let lower = line.to_lowercase();
                CITIZEN_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
            })
            .find_map(|line| {
                let country = classify_citizenship(line);
                if let Some(ref name) = country {
                    debug!("Citizenship keyword line classified as {}", name);
                }
                country
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::normalizer::normalize;

    #[test]
    fn test_document_number_cleanup() {
        assert_eq!(clean_document_number("a-123 4567").as_deref(), Some("A1234567"));
        assert_eq!(clean_document_number("X1234567 Date of issue").as_deref(), Some("X1234567"));
        assert_eq!(clean_document_number("1234"), None);
        assert_eq!(clean_document_number("A12345678901234567"), None);
        assert_eq!(clean_document_number("A12#456"), None);
    }

    #[test]
    fn test_labels_follow_document_type() {
        let passport = document_number_labels(DocumentType::Passport);
        assert_eq!(passport[0], "passport no");
        let license = document_number_labels(DocumentType::DriverLicense);
        assert_eq!(license[0], "license no");
        assert!(license.contains(&"passport no"));
        let mut deduped = license.clone();
        deduped.dedup();
        assert_eq!(deduped.len(), license.len());
    }

    #[test]
    fn test_document_number_from_label() {
        let scan = normalize("DRIVER LICENSE\nLicense No: d12-345-678\nClass C");
        let found = IdentityLabelExtractor::document_number(&scan, DocumentType::DriverLicense).unwrap();
        assert_eq!(found.value, "D12345678");
        assert_eq!(found.strategy, Strategy::LabelSubstring);
    }

    #[test]
    fn test_name_rejects_digits() {
        assert_eq!(clean_name("  Jane   Roe "), Some("Jane Roe".to_string()));
        assert_eq!(clean_name("A1234567"), None);
        assert_eq!(clean_name("J"), None);

        let scan = normalize("Name: 12345\nFull Name: Siti Binti Rahman");
        let found = IdentityLabelExtractor::full_name(&scan, DocumentType::IdCard).unwrap();
        assert_eq!(found.value, "Siti Binti Rahman");
    }

    #[test]
    fn test_nationality_label() {
        let scan = normalize("Nationality: MALAYSIAN");
        assert_eq!(IdentityLabelExtractor::nationality(&scan).unwrap().value, "Malaysia");

        let scan = normalize("Nationality: Utopian");
        assert_eq!(IdentityLabelExtractor::nationality(&scan).unwrap().value, "Utopian");
    }

    #[test]
    fn test_document_dates() {
        let scan = normalize("Date of Issue: 12 Jan 2021\nDate of Expiry: 11/01/2031");
        let issued = IdentityLabelExtractor::issuance_date(&scan).unwrap();
        assert_eq!(issued.value, NaiveDate::from_ymd_opt(2021, 1, 12).unwrap());
        assert_eq!(issued.strategy, Strategy::LabelSubstring);
        let expires = IdentityLabelExtractor::expiry_date(&scan).unwrap();
        assert_eq!(expires.value, NaiveDate::from_ymd_opt(2031, 1, 11).unwrap());

        let scan = normalize("Date of Expiry: pending\nDate of Expiry: 2030-06-30");
        let expires = IdentityLabelExtractor::expiry_date(&scan).unwrap();
        assert_eq!(expires.value, NaiveDate::from_ymd_opt(2030, 6, 30).unwrap());
    }

    #[test]
    fn test_citizen_keyword() {
        let scan = normalize("This card certifies a citizen of Canada\nSigned");
        assert_eq!(IdentityLabelExtractor::citizen_keyword(&scan).as_deref(), Some("Canada"));

        let scan = normalize("Resident of Canada");
        assert_eq!(IdentityLabelExtractor::citizen_keyword(&scan), None);
    }
}
