use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::models::{ExtractionRules, ScanText, Strategy};
use crate::processing::mrz::MrzFields;
use crate::processing::patterns::PatternSet;
use crate::validation::BirthDateValidator;

const DATE_CORE: &str = r"\d{4}\s*[./\-年]\s*\d{1,2}\s*[./\-月]\s*\d{1,2}\s*日?|\d{1,2}\s*[./\-]\s*\d{1,2}\s*[./\-]\s*\d{4}|\d{1,2}\s+[A-Za-z]{3,9}\.?,?\s+\d{4}|[A-Za-z]{3,9}\.?\s+\d{1,2},?\s+\d{4}";
const BIRTH_LABEL: &str = r"date\s*of\s*birth|birth\s*date|\bd\.?\s*o\.?\s*b\b\.?|born(?:\s+on)?|tarikh\s+lahir|出生日期|出生年月日|生年月日|出生";

lazy_static! {
    static ref LABELED_BIRTH_DATE: PatternSet = PatternSet::new(
        "labeled-birth-date",
        &[
            format!(r"(?i)(?:{})\s*[:：]?\s*(?:\([^)]*\)\s*)?[:：]?\s*({})", BIRTH_LABEL, DATE_CORE).as_str(),
            format!(r"(?i)({})\s*[(\[]?\s*(?:{})", DATE_CORE, BIRTH_LABEL).as_str(),
        ],
    );

    static ref BIRTH_YEAR_MENTION: PatternSet = PatternSet::new(
        "birth-year-mention",
        &[
            r"(?i)\bborn\s+(?:in\s+)?(?:the\s+year\s+)?((?:19|20)\d{2})\b",
            r"(?i)\b((?:19|20)\d{2})\b[^\n\d]{0,40}?\bborn\b",
        ],
    );

    static ref PLAUSIBLE_YEAR: Regex = Regex::new(r"\b(19\d{2}|20[0-2]\d)\b").unwrap();
    static ref NON_DIGIT_RUN: Regex = Regex::new(r"[^0-9]+").unwrap();
}

const GENERIC_FORMATS: [&str; 6] = ["%d %B %Y", "%B %d %Y", "%Y-%m-%d", "%Y%m%d", "%d%m%Y", "%d %m %Y"];

/// Collapse CJK date glyphs and every non-digit run to `/`.
pub fn normalize_date_text(text: &str) -> String {
    let replaced = text.replace('年', "/").replace('月', "/").replace('日', "");
    NON_DIGIT_RUN
        .replace_all(&replaced, "/")
        .trim_matches('/')
        .to_string()
}

/// Candidate calendar dates for a matched date string, in preference
/// order: `YYYY/MM/DD`, `DD/MM/YYYY`, `MM/DD/YYYY`, then a generic parse.
pub fn parse_date_candidates(text: &str) -> Vec<NaiveDate> {
    let mut candidates = Vec::new();
    let normalized = normalize_date_text(text);
    let parts: Vec<&str> = normalized.split('/').collect();

    if parts.len() == 3 {
        let nums: Vec<Option<u32>> = parts.iter().map(|p| p.parse::<u32>().ok()).collect();
        if let (Some(a), Some(b), Some(c)) = (nums[0], nums[1], nums[2]) {
            if parts[0].len() == 4 {
                candidates.extend(NaiveDate::from_ymd_opt(a as i32, b, c));
            }
            if parts[2].len() == 4 {
                candidates.extend(NaiveDate::from_ymd_opt(c as i32, b, a));
                candidates.extend(NaiveDate::from_ymd_opt(c as i32, a, b));
            }
        }
    }

    let cleaned = text
        .replace([',', '.'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    for format in GENERIC_FORMATS.iter() {
        if let Ok(date) = NaiveDate::parse_from_str(&cleaned, format) {
            candidates.push(date);
        }
    }

    candidates.dedup();
    candidates
}

/// First parseable date in a free-form value, without any range gate.
/// Used for issuance and expiry dates.
pub fn parse_document_date(text: &str) -> Option<NaiveDate> {
    lazy_static! {
        static ref ANY_DATE: Regex = Regex::new(&format!("(?i)({})", DATE_CORE)).unwrap();
    }
    ANY_DATE
        .find_iter(text)
        .find_map(|m| parse_date_candidates(m.as_str()).into_iter().next())
        .or_else(|| parse_date_candidates(text.trim()).into_iter().next())
}

/// Accepted birth date with the age computed from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BirthResolution {
    pub date_of_birth: NaiveDate,
    pub birth_year: i32,
    pub age: u32,
    pub strategy: Strategy,
}

/// Inputs shared by the birth-date strategies.
pub struct BirthContext<'a> {
    pub scan: &'a ScanText,
    pub mrz: &'a MrzFields,
    pub rules: &'a ExtractionRules,
}

/// Produces candidate birth dates, best first.
pub type BirthStrategy = fn(&BirthContext) -> Vec<NaiveDate>;

/// Priority cascade; the first candidate passing the plausibility gate wins.
pub const BIRTH_STRATEGIES: [(Strategy, BirthStrategy); 5] = [
    (Strategy::Mrz, mrz_name_line),
    (Strategy::MrzDataLine, mrz_data_line),
    (Strategy::LabeledDate, labeled_date),
    (Strategy::BirthYearMention, birth_year_mention),
    (Strategy::YearHeuristic, year_heuristic),
];

pub struct DateResolver;

impl DateResolver {
    pub fn resolve(ctx: &BirthContext) -> Option<BirthResolution> {
        for (strategy, run) in BIRTH_STRATEGIES.iter() {
            for date in run(ctx) {
                match BirthDateValidator::validate(date, ctx.rules) {
                    Some(age) => {
                        debug!("Birth date resolved by {}", strategy);
                        return Some(BirthResolution {
                            date_of_birth: date,
                            birth_year: date.year(),
                            age,
                            strategy: *strategy,
                        });
                    }
                    None => debug!("Discarding implausible birth date {} from {}", date, strategy),
                }
            }
        }
        None
    }
}

fn mrz_name_line(ctx: &BirthContext) -> Vec<NaiveDate> {
    ctx.mrz.date_of_birth.map(|d| d.date).into_iter().collect()
}

fn mrz_data_line(ctx: &BirthContext) -> Vec<NaiveDate> {
    ctx.mrz
        .data_line
        .as_ref()
        .and_then(|line| line.date_of_birth)
        .map(|d| d.date)
        .into_iter()
        .collect()
}

/// Dates next to a birth label, in either order.
fn labeled_date(ctx: &BirthContext) -> Vec<NaiveDate> {
    let text = ctx.scan.joined();
    let mut dates = Vec::new();
    for matched in LABELED_BIRTH_DATE.captures(&text) {
        dates.extend(
            parse_date_candidates(&matched)
                .into_iter()
                .filter(|date| BirthDateValidator::year_in_range(date.year(), ctx.rules)),
        );
    }
    dates
}

fn birth_year_mention(ctx: &BirthContext) -> Vec<NaiveDate> {
    let text = ctx.scan.joined();
    BIRTH_YEAR_MENTION
        .captures(&text)
        .filter_map(|year| year.parse::<i32>().ok())
        .filter(|year| BirthDateValidator::year_in_range(*year, ctx.rules))
        .filter_map(|year| NaiveDate::from_ymd_opt(year, 1, 1))
        .collect()
}

/// Bare 19xx/20[0-2]x years implying an adult; most recent first.
fn year_heuristic(ctx: &BirthContext) -> Vec<NaiveDate> {
    let text = ctx.scan.joined();
    let current_year = ctx.rules.current_year();
    let mut years: Vec<i32> = PLAUSIBLE_YEAR
        .captures_iter(&text)
        .filter_map(|caps| caps[1].parse::<i32>().ok())
        .filter(|year| current_year - year >= ctx.rules.min_adult_age as i32)
        .collect();
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    years
        .into_iter()
        .filter_map(|year| NaiveDate::from_ymd_opt(year, 1, 1))
        .collect()
}
