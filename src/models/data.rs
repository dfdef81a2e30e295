use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Kind of identity document the OCR text came from. Only changes which
/// label synonyms are tried first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    #[default]
    Passport,
    DriverLicense,
    IdCard,
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "passport" => Ok(DocumentType::Passport),
            "driver_license" | "drivers_license" | "driving_licence" => Ok(DocumentType::DriverLicense),
            "id_card" | "id" => Ok(DocumentType::IdCard),
            other => Err(format!("unknown document type: {}", other)),
        }
    }
}

/// Immutable view of one OCR blob: the raw text, a lowercase
/// whitespace-collapsed copy for matching, and the original-case lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanText {
    pub raw: String,
    pub normalized: String,
    pub lines: Vec<String>,
}

impl ScanText {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Original-case lines joined back with newlines.
    pub fn joined(&self) -> String {
        self.lines.join("\n")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuance_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deed_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
}

/// Field names as they appear in provenance maps and serialized output.
pub mod field {
    pub const FULL_NAME: &str = "fullName";
    pub const AGE: &str = "age";
    pub const DATE_OF_BIRTH: &str = "dateOfBirth";
    pub const BIRTH_YEAR: &str = "birthYear";
    pub const NATIONALITY: &str = "nationality";
    pub const DOCUMENT_NUMBER: &str = "documentNumber";
    pub const ISSUANCE_DATE: &str = "issuanceDate";
    pub const EXPIRY_DATE: &str = "expiryDate";

    pub const DEED_NUMBER: &str = "deedNumber";
    pub const ADDRESS: &str = "address";
    pub const OWNER_NAME: &str = "ownerName";
    pub const TAX_ID: &str = "taxId";
}

/// Strategy that produced a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    Mrz,
    MrzDataLine,
    LabelSubstring,
    LabelRegex,
    LabelLineStart,
    LabelFuzzy,
    LabeledDate,
    BirthYearMention,
    YearHeuristic,
    PatternSet,
    CitizenKeyword,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Mrz => "mrz",
            Strategy::MrzDataLine => "mrz-data-line",
            Strategy::LabelSubstring => "label-substring",
            Strategy::LabelRegex => "label-regex",
            Strategy::LabelLineStart => "label-line-start",
            Strategy::LabelFuzzy => "label-fuzzy",
            Strategy::LabeledDate => "labeled-date",
            Strategy::BirthYearMention => "birth-year-mention",
            Strategy::YearHeuristic => "year-heuristic",
            Strategy::PatternSet => "pattern-set",
            Strategy::CitizenKeyword => "citizen-keyword",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field name -> strategy that set it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldProvenance(BTreeMap<String, Strategy>);

impl FieldProvenance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `slot` to `value` unless it already holds one. The first writer
    /// wins, so callers must invoke strategies in priority order.
    pub fn fill<T>(&mut self, slot: &mut Option<T>, field: &str, value: T, strategy: Strategy) -> bool {
        if slot.is_some() {
            return false;
        }
        *slot = Some(value);
        self.0.insert(field.to_string(), strategy);
        true
    }

    pub fn get(&self, field: &str) -> Option<Strategy> {
        self.0.get(field).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Strategy)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Extracted fields together with their provenance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction<T> {
    pub fields: T,
    pub provenance: FieldProvenance,
}

pub type IdentityExtraction = Extraction<IdentityFields>;
pub type PropertyExtraction = Extraction<PropertyFields>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_keeps_first_value() {
        let mut fields = IdentityFields::default();
        let mut provenance = FieldProvenance::new();

        assert!(provenance.fill(&mut fields.nationality, field::NATIONALITY, "Malaysia".to_string(), Strategy::Mrz));
        assert!(!provenance.fill(&mut fields.nationality, field::NATIONALITY, "Canada".to_string(), Strategy::LabelSubstring));

        assert_eq!(fields.nationality.as_deref(), Some("Malaysia"));
        assert_eq!(provenance.get(field::NATIONALITY), Some(Strategy::Mrz));
        assert_eq!(provenance.len(), 1);
    }

    #[test]
    fn test_document_type_from_str() {
        assert_eq!("passport".parse::<DocumentType>(), Ok(DocumentType::Passport));
        assert_eq!("driver-license".parse::<DocumentType>(), Ok(DocumentType::DriverLicense));
        assert_eq!("ID_CARD".parse::<DocumentType>(), Ok(DocumentType::IdCard));
        assert!("visa".parse::<DocumentType>().is_err());
    }

    #[test]
    fn test_serialized_field_names() {
        let fields = IdentityFields {
            birth_year: Some(1985),
            date_of_birth: NaiveDate::from_ymd_opt(1985, 1, 1),
            ..Default::default()
        };
        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json["birthYear"], 1985);
        assert_eq!(json["dateOfBirth"], "1985-01-01");
        assert!(json.get("fullName").is_none());

        let mut provenance = FieldProvenance::new();
        let mut slot = None;
        provenance.fill(&mut slot, field::BIRTH_YEAR, 1985, Strategy::BirthYearMention);
        let json = serde_json::to_value(&provenance).unwrap();
        assert_eq!(json["birthYear"], "birth-year-mention");
    }
}
