use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::models::{field, FieldProvenance, PropertyExtraction, PropertyFields, ScanText, Strategy};
use crate::processing::labels::find_by_labels;
use crate::processing::patterns::PatternSet;

lazy_static! {
    static ref DEED_NUMBER: PatternSet = PatternSet::new(
        "deed-number",
        &[
            r"(?i)\bdeed\s*(?:number|no\.?|#)?\s*[:#.\-]?\s*([a-z0-9][a-z0-9\-/]*)",
            r"(?i)\btitle\s*(?:number|no\.?|#)?\s*[:#.\-]?\s*([a-z0-9][a-z0-9\-/]*)",
            r"(?i)\bproperty\s*id\s*[:#.\-]?\s*([a-z0-9][a-z0-9\-/]*)",
            r"(?i)\breference\s*(?:number|no\.?|#)?\s*[:#.\-]?\s*([a-z0-9][a-z0-9\-/]*)",
            r"(?i)\brecording\s*(?:number|no\.?|#)?\s*[:#.\-]?\s*([a-z0-9][a-z0-9\-/]*)",
            r"(?i)\b(d[0-9]{5,7})\b",
        ],
    );

    static ref ADDRESS: PatternSet = PatternSet::new(
        "address",
        &[
            r"(?i)\b(?:property|premises|site)\s+address\s*[:\-]?\s*([^\n]+)",
            r"(?i)\baddress\s*[:\-]?\s*([^\n]+)",
            r"(?i)\b(?:situated|located)\s+at\s*[:\-]?\s*([^\n]+)",
            r"(?i)\balamat\s*[:\-]?\s*([^\n]+)",
        ],
    );

    static ref OWNER_NAME: PatternSet = PatternSet::new(
        "owner-name",
        &[
            r"(?i)\bowner(?:'s)?\s+name\s*[:\-]?\s*([^\n]+)",
            r"(?i)\bregistered\s+owner\s*[:\-]?\s*([^\n]+)",
            r"(?i)\bowner\s*[:\-]\s*([^\n]+)",
            r"(?i)\bgrantee\s*[:\-]?\s*([^\n]+)",
            r"(?i)\bproprietor\s*[:\-]?\s*([^\n]+)",
            r"(?i)\bnama\s+pemilik\s*[:\-]?\s*([^\n]+)",
        ],
    );

    static ref TAX_ID: PatternSet = PatternSet::new(
        "tax-id",
        &[
            r"(?i)\btax\s*(?:id|identification\s*(?:number|no\.?)?|number|no\.?|#)\s*[:#.\-]?\s*([a-z0-9][a-z0-9\-]*)",
            r"(?i)\btin\s*[:#.\-]?\s*([a-z0-9][a-z0-9\-]*)",
            r"(?i)\bparcel\s*(?:number|no\.?|id|#)?\s*[:#.\-]?\s*([a-z0-9][a-z0-9\-]*)",
            r"(?i)\bapn\s*[:#.\-]?\s*([a-z0-9][a-z0-9\-]*)",
        ],
    );

    /// Start of the next labelled field on the same line.
    static ref NEXT_LABEL: Regex = Regex::new(
        r"(?i)\s*(?:\.{2,}|;|\b(?:owner|grantee|grantor|proprietor|tax\s*id|tin|parcel|apn|deed\s*(?:number|no)|title\s*(?:number|no)|recording|reference|address)\b|\bdated?\s*:|\bdated\s+(?:\d|[a-z]{3,9}\.?\s+\d)).*$"
    )
    .unwrap();
}

const DEED_LABELS: &[&str] = &["deed number", "deed no", "title number", "title no", "property id", "recording number"];
const ADDRESS_LABELS: &[&str] = &["property address", "address", "located at"];
const OWNER_LABELS: &[&str] = &["owner name", "registered owner", "grantee", "proprietor"];
const TAX_ID_LABELS: &[&str] = &["tax id", "tax identification number", "parcel number", "apn"];

/// Deed and tax identifiers: the first token, made of letters, digits,
/// `-` and `/`, with at least one digit.
fn clean_identifier(value: &str) -> Option<String> {
    let token = value
        .split_whitespace()
        .next()?
        .trim_matches(|c: char| !c.is_ascii_alphanumeric());
    let shaped = token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '/');
    if token.len() >= 3 && shaped && token.chars().any(|c| c.is_ascii_digit()) {
        Some(token.to_uppercase())
    } else {
        None
    }
}

fn cut_at_next_label(value: &str) -> &str {
    match NEXT_LABEL.find(value) {
        Some(m) => &value[..m.start()],
        None => value,
    }
}

fn clean_address(value: &str) -> Option<String> {
    let address = cut_at_next_label(value)
        .trim()
        .trim_end_matches(|c: char| c == ',' || c == '.')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if address.chars().count() >= 5 && address.chars().any(|c| c.is_alphabetic()) {
        Some(address)
    } else {
        None
    }
}

fn clean_owner(value: &str) -> Option<String> {
    let owner = cut_at_next_label(value)
        .trim_matches(|c: char| !c.is_alphabetic())
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let letters = owner.chars().filter(|c| c.is_alphabetic()).count();
    if letters >= 2 && !owner.chars().any(|c| c.is_ascii_digit()) {
        Some(owner)
    } else {
        None
    }
}

/// Pattern set first, label strategies as the fallback.
fn resolve<F>(
    set: &PatternSet,
    labels: &[&str],
    scan: &ScanText,
    accept: F,
) -> Option<(String, Strategy)>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = set.search(scan, &accept) {
        return Some((value, Strategy::PatternSet));
    }
    debug!("Pattern set '{}' found nothing, trying labels", set.name);
    find_by_labels(labels, scan, &accept).map(|found| (found.value, found.strategy))
}

pub struct PropertyExtractor;

impl PropertyExtractor {
    pub fn extract(scan: &ScanText) -> PropertyExtraction {
        let mut fields = PropertyFields::default();
        let mut provenance = FieldProvenance::new();
        if scan.is_empty() {
            return PropertyExtraction { fields, provenance };
        }

        if let Some((value, strategy)) = resolve(&DEED_NUMBER, DEED_LABELS, scan, clean_identifier) {
            provenance.fill(&mut fields.deed_number, field::DEED_NUMBER, value, strategy);
        }
        if let Some((value, strategy)) = resolve(&ADDRESS, ADDRESS_LABELS, scan, clean_address) {
            provenance.fill(&mut fields.address, field::ADDRESS, value, strategy);
        }
        if let Some((value, strategy)) = resolve(&OWNER_NAME, OWNER_LABELS, scan, clean_owner) {
            provenance.fill(&mut fields.owner_name, field::OWNER_NAME, value, strategy);
        }
        if let Some((value, strategy)) = resolve(&TAX_ID, TAX_ID_LABELS, scan, clean_identifier) {
            provenance.fill(&mut fields.tax_id, field::TAX_ID, value, strategy);
        }

        debug!("Property extraction resolved {} field(s)", provenance.len());
        PropertyExtraction { fields, provenance }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::normalizer::normalize;

    #[test]
    fn test_deed_and_tax_id_on_one_line() {
        let result = PropertyExtractor::extract(&normalize("Deed Number: D123456 ... Tax ID: TX-4821"));
        assert_eq!(result.fields.deed_number.as_deref(), Some("D123456"));
        assert_eq!(result.fields.tax_id.as_deref(), Some("TX-4821"));
        assert_eq!(result.provenance.get(field::DEED_NUMBER), Some(Strategy::PatternSet));
    }

    #[test]
    fn test_full_deed() {
        let text = "GRANT DEED\n\
                    Recording No. 2019-0048812\n\
                    Property Address: 42 Harbour View Rd, Penang 10050\n\
                    Grantee: Lim Mei Ling\n\
                    APN: 118-220-09";
        let result = PropertyExtractor::extract(&normalize(text));
        assert_eq!(result.fields.deed_number.as_deref(), Some("2019-0048812"));
        assert_eq!(result.fields.address.as_deref(), Some("42 Harbour View Rd, Penang 10050"));
        assert_eq!(result.fields.owner_name.as_deref(), Some("Lim Mei Ling"));
        assert_eq!(result.fields.tax_id.as_deref(), Some("118-220-09"));
    }

    #[test]
    fn test_bare_deed_number() {
        let result = PropertyExtractor::extract(&normalize("scanned copy d7654321 page 1"));
        assert_eq!(result.fields.deed_number.as_deref(), Some("D7654321"));
    }

    #[test]
    fn test_address_stops_at_next_label() {
        let result = PropertyExtractor::extract(&normalize("Address: 7 Jalan Ampang, Kuala Lumpur Owner: Tan Ah Kow"));
        assert_eq!(result.fields.address.as_deref(), Some("7 Jalan Ampang, Kuala Lumpur"));
        assert_eq!(result.fields.owner_name.as_deref(), Some("Tan Ah Kow"));
    }

    #[test]
    fn test_deed_without_number_label() {
        let text = "WARRANTY DEED\n\
                    Property Address: 42 Harbour View Rd, Penang\n\
                    Property Tax Year 2024\n\
                    Grantee: Lim Mei Ling";
        let result = PropertyExtractor::extract(&normalize(text));
        assert_eq!(result.fields.deed_number, None);
        assert_eq!(result.fields.tax_id, None);
        assert_eq!(result.fields.address.as_deref(), Some("42 Harbour View Rd, Penang"));
        assert_eq!(result.fields.owner_name.as_deref(), Some("Lim Mei Ling"));
        assert_eq!(result.provenance.len(), 2);
    }

    #[test]
    fn test_identifier_is_a_single_token() {
        assert_eq!(clean_identifier("TX-4821 issued 2020").as_deref(), Some("TX-4821"));
        assert_eq!(clean_identifier("Address: 42 Harbour View Rd"), None);
        assert_eq!(clean_identifier("Year 2024"), None);
        assert_eq!(clean_identifier("12#45"), None);
    }

    #[test]
    fn test_street_named_date_is_kept() {
        let result = PropertyExtractor::extract(&normalize("Property Address: 12 Date Palm Street, Miami"));
        assert_eq!(result.fields.address.as_deref(), Some("12 Date Palm Street, Miami"));

        let result = PropertyExtractor::extract(&normalize("Address: 5 Elm Street Dated: 2020-01-01"));
        assert_eq!(result.fields.address.as_deref(), Some("5 Elm Street"));
        let result = PropertyExtractor::extract(&normalize("Address: 5 Elm Street dated 3 March 2020"));
        assert_eq!(result.fields.address.as_deref(), Some("5 Elm Street"));
    }

    #[test]
    fn test_empty_text() {
        let result = PropertyExtractor::extract(&normalize(""));
        assert_eq!(result.fields, PropertyFields::default());
        assert!(result.provenance.is_empty());
    }
}
