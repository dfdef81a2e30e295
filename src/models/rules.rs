use crate::utils::{ExtractionError, Result};
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunable thresholds for the date and age strategies.
///
/// The century pivot and the adult-age filter are empirical; they are kept
/// here rather than baked into the resolver so deployments can adjust them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionRules {
    /// Two-digit years above `today.year % 100 + century_pivot_offset` are
    /// read as 19xx, everything else as 20xx.
    pub century_pivot_offset: u32,
    /// Minimum implied age for a bare year to count in the heuristic scan.
    pub min_adult_age: u32,
    /// Exclusive upper bound for an accepted age.
    pub max_age: u32,
    /// Exclusive lower bound for an accepted birth year.
    pub min_birth_year: i32,
    /// Fixed "today". `None` uses the local clock.
    pub reference_date: Option<NaiveDate>,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        ExtractionRules {
            century_pivot_offset: 20,
            min_adult_age: 18,
            max_age: 120,
            min_birth_year: 1900,
            reference_date: None,
        }
    }
}

impl ExtractionRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules pinned to a given day.
    pub fn at(reference_date: NaiveDate) -> Self {
        ExtractionRules {
            reference_date: Some(reference_date),
            ..Self::default()
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn current_year(&self) -> i32 {
        self.today().year()
    }

    /// Two-digit year at or below which MRZ years resolve to the 2000s.
    pub fn century_pivot(&self) -> u32 {
        (self.current_year().rem_euclid(100)) as u32 + self.century_pivot_offset
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let rules: ExtractionRules = serde_json::from_str(json)?;
        rules.check()?;
        Ok(rules)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(&path)?;
        Self::from_json_str(&contents)
    }

    fn check(&self) -> Result<()> {
        if self.max_age == 0 {
            return Err(ExtractionError::ConfigError("max_age must be positive".to_string()));
        }
        if self.min_adult_age >= self.max_age {
            return Err(ExtractionError::ConfigError(format!(
                "min_adult_age ({}) must be below max_age ({})",
                self.min_adult_age, self.max_age
            )));
        }
        if self.century_pivot_offset > 99 {
            return Err(ExtractionError::ConfigError(format!(
                "century_pivot_offset out of range: {}",
                self.century_pivot_offset
            )));
        }
        Ok(())
    }
}
