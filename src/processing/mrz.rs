use chrono::NaiveDate;
use lazy_static::lazy_static;
use log::{debug, trace};
use regex::Regex;

use crate::models::countries::{is_known_code, nationality_for_code};
use crate::models::{ExtractionRules, ScanText};
use crate::processing::field_correction::{
    find_digit_run, normalize_p_markers, repair_digits, repair_name_fillers, split_passport_header,
};
use crate::utils::{ExtractionError, Result};

lazy_static! {
    static ref KNOWN_CODE_HEADER: Regex =
        Regex::new(r"P[<KLC](?:USA|MYS|GBR|CAN|AUS|NZL|DEU|FRA|SGP|IDN|IND|CHN|JPN|MEX)").unwrap();
    static ref FILLER_RUN: Regex = Regex::new(r"[KLC]{2,}").unwrap();
    static ref LOOSE_HEADER: Regex = Regex::new(r"P[<KLC][A-Z]{3}[A-Z0-9<KLC]+").unwrap();
    // TD3 data line: document number, check, nationality, birth date, check, sex, expiry.
    static ref TD3_DATA_LINE: Regex = Regex::new(
        r"^([A-Z0-9<]{9})[0-9<OI]([A-Z<]{3})([0-9OoISBGlgq]{6})[0-9<OI]([MFX<])([0-9OoISBGlgq]{6})"
    ).unwrap();
}

const MALAY_CONNECTORS: [(&str, &str); 4] = [("BIN", "BIN"), ("BINTI", "BINTI"), ("B", "BIN"), ("BT", "BINTI")];

/// A line believed to hold the MRZ name line. `index` points into
/// `ScanText::lines` when the line was found line-by-line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedLine {
    pub line: String,
    pub index: Option<usize>,
}

/// Transient decode state for one name line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MrzCandidate {
    pub line: String,
    pub country_code: String,
    pub name_portion: String,
    pub dob_digits: Option<String>,
}

/// Birth date read from six MRZ digits. `year_only` marks the January 1st
/// approximation used when month/day did not form a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MrzDate {
    pub date: NaiveDate,
    pub year_only: bool,
}

/// Fields read from the TD3 line following the name line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MrzDataLine {
    pub document_number: String,
    pub date_of_birth: Option<MrzDate>,
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MrzFields {
    pub country_code: Option<String>,
    pub nationality: Option<String>,
    pub full_name: Option<String>,
    pub date_of_birth: Option<MrzDate>,
    pub data_line: Option<MrzDataLine>,
}

impl MrzFields {
    pub fn is_empty(&self) -> bool {
        *self == MrzFields::default()
    }
}

pub struct MrzDecoder;

impl MrzDecoder {
    /// Locate and decode the MRZ. Any failure yields empty fields so the
    /// caller falls back to label extraction.
    pub fn extract(scan: &ScanText, rules: &ExtractionRules) -> MrzFields {
        let located = match Self::locate(scan) {
            Some(located) => located,
            None => {
                debug!("No MRZ name line found");
                return MrzFields::default();
            }
        };
        debug!("MRZ candidate line: {}", located.line);

        let mut fields = match Self::decode(&located.line, rules) {
            Ok(fields) => fields,
            Err(e) => {
                debug!("MRZ decode failed: {}", e);
                return MrzFields::default();
            }
        };

        if let Some(index) = located.index {
            fields.data_line = scan
                .lines
                .iter()
                .skip(index + 1)
                .take(2)
                .find_map(|line| Self::decode_data_line(line, rules));
        }
        fields
    }

    /// Try the three locator strategies in order.
    pub fn locate(scan: &ScanText) -> Option<LocatedLine> {
        Self::locate_by_shape(scan)
            .or_else(|| Self::locate_by_country_code(scan))
            .or_else(|| Self::locate_by_pattern(scan))
    }

    /// Longest line over 20 characters that carries a `P<` marker (or a
    /// K/L/C misread of it) or is entirely upper-case, and that has a
    /// decodable header.
    fn locate_by_shape(scan: &ScanText) -> Option<LocatedLine> {
        let mut best: Option<LocatedLine> = None;
        for (index, line) in scan.lines.iter().enumerate() {
            if line.chars().count() <= 20 {
                continue;
            }
            let has_marker = ["P<", "PK", "PL", "PC"].iter().any(|m| line.contains(m));
            if !(has_marker || is_upper_case(line)) {
                continue;
            }
            if Self::candidate(line).is_err() {
                trace!("Skipping MRZ-shaped line without a name zone: {}", line);
                continue;
            }
            let longer = best
                .as_ref()
                .map_or(true, |b| line.chars().count() > b.line.chars().count());
            if longer {
                best = Some(LocatedLine { line: line.clone(), index: Some(index) });
            }
        }
        best
    }

    fn locate_by_country_code(scan: &ScanText) -> Option<LocatedLine> {
        scan.lines
            .iter()
            .enumerate()
            .filter(|(_, line)| KNOWN_CODE_HEADER.is_match(line))
            .find(|(_, line)| Self::candidate(line).is_ok())
            .map(|(index, line)| LocatedLine { line: line.clone(), index: Some(index) })
    }

    fn locate_by_pattern(scan: &ScanText) -> Option<LocatedLine> {
        let substituted = normalize_p_markers(&scan.raw);
        let mut best: Option<&str> = None;
        for m in LOOSE_HEADER.find_iter(&substituted) {
            if Self::candidate(m.as_str()).is_err() {
                continue;
            }
            if best.map_or(true, |b| m.as_str().len() > b.len()) {
                best = Some(m.as_str());
            }
        }
        best.map(|line| LocatedLine { line: line.to_string(), index: None })
    }

    /// Decode a located name line into nationality, name and birth date.
    pub fn decode(line: &str, rules: &ExtractionRules) -> Result<MrzFields> {
        let candidate = Self::candidate(line)?;

        let code = candidate.country_code.trim_end_matches('<');
        if code.is_empty() {
            return Err(ExtractionError::MrzParsingError(format!("empty country code in {}", line)));
        }
        let nationality = nationality_for_code(&candidate.country_code);

        let full_name = Self::decode_name(&candidate.name_portion);
        let date_of_birth = candidate
            .dob_digits
            .as_deref()
            .and_then(|digits| birth_date_from_digits(digits, rules));

        Ok(MrzFields {
            country_code: Some(candidate.country_code),
            nationality: Some(nationality),
            full_name,
            date_of_birth,
            data_line: None,
        })
    }

    fn candidate(line: &str) -> Result<MrzCandidate> {
        let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
        let (country_code, remainder) = split_passport_header(&compact)
            .ok_or_else(|| ExtractionError::MrzParsingError(format!("no document header in {}", line)))?;

        if !looks_like_name_zone(&remainder) {
            return Err(ExtractionError::MrzParsingError(format!("not an MRZ name zone: {}", line)));
        }
        // Without a single real filler, only a known country code on an
        // unbroken line counts as a misread MRZ.
        if !remainder.contains('<') && (!is_known_code(&country_code) || line.trim().contains(char::is_whitespace)) {
            return Err(ExtractionError::MrzParsingError(format!("no filler and no known header in {}", line)));
        }

        let name_end = remainder.find(|c: char| c.is_ascii_digit()).unwrap_or(remainder.len());
        Ok(MrzCandidate {
            line: compact,
            country_code,
            name_portion: remainder[..name_end].to_string(),
            dob_digits: find_digit_run(&remainder),
        })
    }

    /// Name portion -> display name. Fillers become spaces; Malaysian
    /// patronymics are reassembled as `<given> BIN|BINTI <family>`.
    pub fn decode_name(portion: &str) -> Option<String> {
        let repaired = repair_name_fillers(portion);
        let spaced = repaired.replace('<', " ");
        let tokens: Vec<&str> = spaced.split_whitespace().collect();
        if tokens.is_empty() {
            return None;
        }

        let name = match malay_connector(&tokens) {
            Some((index, connector)) => format!(
                "{} {} {}",
                tokens[..index].join(" "),
                connector,
                tokens[index + 1..].join(" ")
            ),
            None => tokens.join(" "),
        };

        if name.chars().filter(|c| c.is_alphabetic()).count() < 2 {
            return None;
        }
        Some(name)
    }

    fn decode_data_line(line: &str, rules: &ExtractionRules) -> Option<MrzDataLine> {
        let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
        let caps = TD3_DATA_LINE.captures(&compact)?;

        let document_number = caps[1].replace('<', "");
        if document_number.len() < 5 {
            return None;
        }
        let date_of_birth = birth_date_from_digits(&repair_digits(&caps[3]), rules);
        let expiry_date = expiry_date_from_digits(&repair_digits(&caps[5]));

        debug!("MRZ data line decoded (document number, birth date, expiry)");
        Some(MrzDataLine {
            document_number,
            date_of_birth,
            expiry_date,
        })
    }
}

/// MRZ alphabet only (a stray character or two tolerated), with at least
/// one filler or a K/L/C run standing in for misread fillers.
fn looks_like_name_zone(remainder: &str) -> bool {
    let total = remainder.chars().count();
    if total == 0 {
        return false;
    }
    let mrz_chars = remainder
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '<')
        .count();
    if mrz_chars * 10 < total * 9 {
        return false;
    }
    remainder.contains('<') || FILLER_RUN.is_match(remainder)
}

fn is_upper_case(line: &str) -> bool {
    line.chars().any(|c| c.is_alphabetic()) && !line.chars().any(|c| c.is_lowercase())
}

fn malay_connector(tokens: &[&str]) -> Option<(usize, &'static str)> {
    if tokens.len() < 3 {
        return None;
    }
    tokens
        .iter()
        .enumerate()
        .skip(1)
        .take(tokens.len() - 2)
        .find_map(|(index, token)| {
            MALAY_CONNECTORS
                .iter()
                .find(|(form, _)| form == token)
                .map(|(_, expanded)| (index, *expanded))
        })
}

/// Two-digit year to four digits: above the pivot means the 1900s.
pub fn resolve_century(yy: u32, rules: &ExtractionRules) -> i32 {
    if yy > rules.century_pivot() {
        1900 + yy as i32
    } else {
        2000 + yy as i32
    }
}

fn parse_two(digits: &str, range: std::ops::Range<usize>) -> Result<u32> {
    digits
        .get(range)
        .and_then(|part| part.parse::<u32>().ok())
        .ok_or_else(|| ExtractionError::InvalidDate(format!("not a YYMMDD value: {}", digits)))
}

fn parse_birth_date(digits: &str, rules: &ExtractionRules) -> Result<MrzDate> {
    let year = resolve_century(parse_two(digits, 0..2)?, rules);
    let month = parse_two(digits, 2..4)?;
    let day = parse_two(digits, 4..6)?;

    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => Ok(MrzDate { date, year_only: false }),
        None => {
            debug!("MRZ birth date {}-{}-{} is not a calendar date, keeping year", year, month, day);
            let date = NaiveDate::from_ymd_opt(year, 1, 1)
                .ok_or_else(|| ExtractionError::InvalidDate(format!("year {}", year)))?;
            Ok(MrzDate { date, year_only: true })
        }
    }
}

/// `YYMMDD` to a birth date, falling back to the year alone (read from the
/// corrected two-digit prefix) when the digits cannot be parsed.
pub fn birth_date_from_digits(digits: &str, rules: &ExtractionRules) -> Option<MrzDate> {
    let digits = repair_digits(digits);
    match parse_birth_date(&digits, rules) {
        Ok(date) => Some(date),
        Err(e) => {
            debug!("Falling back to MRZ birth year: {}", e);
            let yy = parse_two(&digits, 0..2).ok()?;
            NaiveDate::from_ymd_opt(resolve_century(yy, rules), 1, 1)
                .map(|date| MrzDate { date, year_only: true })
        }
    }
}

/// Expiry dates lie in the future, so they always resolve to the 2000s.
fn expiry_date_from_digits(digits: &str) -> Option<NaiveDate> {
    let yy = parse_two(digits, 0..2).ok()?;
    let month = parse_two(digits, 2..4).ok()?;
    let day = parse_two(digits, 4..6).ok()?;
    NaiveDate::from_ymd_opt(2000 + yy as i32, month, day)
}
