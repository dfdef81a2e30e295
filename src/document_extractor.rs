use log::debug;

use crate::models::*;
use crate::processing::dates::{BirthContext, DateResolver};
use crate::processing::extractors::IdentityLabelExtractor;
use crate::processing::mrz::{MrzDecoder, MrzFields};
use crate::processing::normalizer::normalize;
use crate::processing::property::PropertyExtractor;

/// Entry point for both document kinds. Holds only the thresholds; every
/// call works on its own input and shares nothing.
#[derive(Debug, Clone, Default)]
pub struct DocumentExtractor {
    rules: ExtractionRules,
}

impl DocumentExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: ExtractionRules) -> Self {
        DocumentExtractor { rules }
    }

    pub fn rules(&self) -> &ExtractionRules {
        &self.rules
    }

    /// Identity document fields. Never fails; fields no strategy could
    /// validate are left absent.
    pub fn extract_identity(&self, text: &str, document_type: DocumentType) -> IdentityExtraction {
        let mut fields = IdentityFields::default();
        let mut provenance = FieldProvenance::new();

        // Step 1: Normalize the OCR text
        let scan = normalize(text);
        if scan.is_empty() {
            debug!("Empty input, nothing to extract");
            return IdentityExtraction { fields, provenance };
        }

        // Step 2: Decode the machine-readable zone
        let mrz = MrzDecoder::extract(&scan, &self.rules);
        Self::apply_mrz(&mrz, &mut fields, &mut provenance);

        // Step 3: Fill what is still missing from labels
        Self::apply_labels(&scan, document_type, &mut fields, &mut provenance);

        // Step 4: Date of birth and age cascade
        if fields.date_of_birth.is_none() || fields.age.is_none() {
            let ctx = BirthContext { scan: &scan, mrz: &mrz, rules: &self.rules };
            if let Some(found) = DateResolver::resolve(&ctx) {
                provenance.fill(&mut fields.date_of_birth, field::DATE_OF_BIRTH, found.date_of_birth, found.strategy);
                provenance.fill(&mut fields.birth_year, field::BIRTH_YEAR, found.birth_year, found.strategy);
                provenance.fill(&mut fields.age, field::AGE, found.age, found.strategy);
            }
        }

        // Step 5: Citizenship keywords as the last nationality source
        if fields.nationality.is_none() {
            if let Some(country) = IdentityLabelExtractor::citizen_keyword(&scan) {
                provenance.fill(&mut fields.nationality, field::NATIONALITY, country, Strategy::CitizenKeyword);
            }
        }

        debug!("Identity extraction resolved {} field(s)", provenance.len());
        IdentityExtraction { fields, provenance }
    }

    /// Property deed fields. Never fails.
    pub fn extract_property(&self, text: &str) -> PropertyExtraction {
        PropertyExtractor::extract(&normalize(text))
    }

    fn apply_mrz(mrz: &MrzFields, fields: &mut IdentityFields, provenance: &mut FieldProvenance) {
        if let Some(name) = &mrz.full_name {
            provenance.fill(&mut fields.full_name, field::FULL_NAME, name.clone(), Strategy::Mrz);
        }
        if let Some(nationality) = &mrz.nationality {
            provenance.fill(&mut fields.nationality, field::NATIONALITY, nationality.clone(), Strategy::Mrz);
        }
        if let Some(data_line) = &mrz.data_line {
            provenance.fill(
                &mut fields.document_number,
                field::DOCUMENT_NUMBER,
                data_line.document_number.clone(),
                Strategy::MrzDataLine,
            );
            if let Some(expiry) = data_line.expiry_date {
                provenance.fill(&mut fields.expiry_date, field::EXPIRY_DATE, expiry, Strategy::MrzDataLine);
            }
        }
    }

    fn apply_labels(
        scan: &ScanText,
        document_type: DocumentType,
        fields: &mut IdentityFields,
        provenance: &mut FieldProvenance,
    ) {
        if fields.document_number.is_none() {
            if let Some(found) = IdentityLabelExtractor::document_number(scan, document_type) {
                provenance.fill(&mut fields.document_number, field::DOCUMENT_NUMBER, found.value, found.strategy);
            }
        }
        if fields.full_name.is_none() {
            if let Some(found) = IdentityLabelExtractor::full_name(scan, document_type) {
                provenance.fill(&mut fields.full_name, field::FULL_NAME, found.value, found.strategy);
            }
        }
        if fields.nationality.is_none() {
            if let Some(found) = IdentityLabelExtractor::nationality(scan) {
                provenance.fill(&mut fields.nationality, field::NATIONALITY, found.value, found.strategy);
            }
        }
        if fields.issuance_date.is_none() {
            if let Some(found) = IdentityLabelExtractor::issuance_date(scan) {
                provenance.fill(&mut fields.issuance_date, field::ISSUANCE_DATE, found.value, found.strategy);
            }
        }
        if fields.expiry_date.is_none() {
            if let Some(found) = IdentityLabelExtractor::expiry_date(scan) {
                provenance.fill(&mut fields.expiry_date, field::EXPIRY_DATE, found.value, found.strategy);
            }
        }
    }
}

/// [`DocumentExtractor::extract_identity`] with default rules.
pub fn extract_identity(text: &str, document_type: DocumentType) -> IdentityExtraction {
    DocumentExtractor::new().extract_identity(text, document_type)
}

/// [`DocumentExtractor::extract_property`] with default rules.
pub fn extract_property(text: &str) -> PropertyExtraction {
    DocumentExtractor::new().extract_property(text)
}
