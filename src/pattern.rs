//! File name pattern matching
//!
//! Decides which file names count as input documents, using a glob pattern
//! matched case-insensitively.

use glob::{MatchOptions, Pattern};

use crate::error::{Result, Xml2CsvError};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Compiled file name matcher
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    pattern: Pattern,
}

impl PatternMatcher {
    /// Compile a glob pattern
    ///
    /// # Examples
    /// ```
    /// use xml2csv::pattern::PatternMatcher;
    ///
    /// let matcher = PatternMatcher::new("*_PDR_*.xml").unwrap();
    /// assert!(matcher.matches("flow_PDR_1.XML"));
    /// assert!(!matcher.matches("other.xml"));
    /// ```
    pub fn new(pattern: &str) -> Result<Self> {
        let compiled = Pattern::new(pattern).map_err(|_| Xml2CsvError::InvalidPattern {
            pattern: pattern.to_string(),
        })?;

        Ok(Self { pattern: compiled })
    }

    /// Whether the file name matches
    pub fn matches(&self, file_name: &str) -> bool {
        self.pattern.matches_with(file_name, MATCH_OPTIONS)
    }

    /// The source pattern text
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}
