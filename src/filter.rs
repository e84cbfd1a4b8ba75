//! Row content filter
//!
//! Case-insensitive substring filter over whole rows. Comma separated terms
//! are OR-ed together.

use crate::record::FlatRecord;

/// Compiled `--grep` filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFilter {
    terms: Vec<String>,
}

impl RowFilter {
    /// Build a filter from a comma separated term list.
    ///
    /// Terms are trimmed and lowercased; empty terms are dropped. A missing or
    /// blank list gives a filter that keeps every row.
    ///
    /// # Examples
    /// ```
    /// use xml2csv::filter::RowFilter;
    ///
    /// let filter = RowFilter::new(Some(" TAU1, ,tau3 "));
    /// assert_eq!(filter.terms(), ["tau1", "tau3"]);
    /// assert!(!RowFilter::new(Some(" , ")).is_active());
    /// ```
    pub fn new(list: Option<&str>) -> Self {
        let terms = list
            .map(|s| {
                s.split(',')
                    .map(|t| t.trim().to_lowercase())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self { terms }
    }

    /// Whether any term is set
    pub fn is_active(&self) -> bool {
        !self.terms.is_empty()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// True when any term occurs in the row's concatenated values
    pub fn matches(&self, record: &FlatRecord) -> bool {
        if !self.is_active() {
            return true;
        }
        let haystack = record.search_text();
        self.terms.iter().any(|term| haystack.contains(term.as_str()))
    }

    /// Keep matching rows, preserving order
    pub fn apply(&self, records: Vec<FlatRecord>) -> Vec<FlatRecord> {
        if !self.is_active() {
            return records;
        }
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}
