use std::collections::{BTreeMap, HashMap};
use std::fmt;

use tracing::{debug, trace};

use crate::domain::{TableConfig, TableError};

/// A single cell value of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Absent or empty values are skipped by column filters.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

/// One row of the input data, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: HashMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.values()
    }

    /// Display string of a field, empty when the field is absent.
    pub fn display(&self, key: &str) -> String {
        self.get(key).map(|v| v.to_string()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub key: String,
    pub title: String,
}

impl ColumnDef {
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn label(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortConfig {
    pub key: String,
    pub direction: SortDirection,
}

/// The mutable, per-instance state that parameterizes the derived view.
#[derive(Debug, Clone)]
pub struct ViewState {
    column_order: Vec<String>,
    column_widths: HashMap<String, u16>,
    sort: Option<SortConfig>,
    filters: BTreeMap<String, String>,
    search_term: String,
    current_page: usize,
    page_size: usize,
    min_column_width: u16,
}

impl ViewState {
    pub fn new(columns: &[ColumnDef], config: &TableConfig) -> Self {
        Self {
            column_order: columns.iter().map(|c| c.key.clone()).collect(),
            column_widths: columns
                .iter()
                .map(|c| (c.key.clone(), config.default_column_width))
                .collect(),
            sort: None,
            filters: BTreeMap::new(),
            search_term: String::new(),
            current_page: 1,
            page_size: config.page_size.max(1),
            min_column_width: config.min_column_width,
        }
    }

    /// Ascending on a new key, flips to descending when already ascending on `key`.
    pub fn sort(&mut self, key: &str) {
        let direction = match &self.sort {
            Some(s) if s.key == key && s.direction == SortDirection::Ascending => {
                SortDirection::Descending
            }
            _ => SortDirection::Ascending,
        };
        trace!("Sort {key} {direction:?}");
        self.sort = Some(SortConfig {
            key: key.to_string(),
            direction,
        });
    }

    /// Sets a case-insensitive column filter, an empty value removes it.
    pub fn filter(&mut self, key: &str, value: &str) {
        if value.is_empty() {
            self.filters.remove(key);
        } else {
            self.filters.insert(key.to_string(), value.to_string());
        }
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.search_term.clear();
    }

    pub fn search(&mut self, value: &str) {
        self.search_term = value.to_lowercase();
    }

    /// Replaces the column order. Anything but a permutation of the current keys is rejected.
    pub fn reorder(&mut self, new_order: Vec<String>) -> Result<(), TableError> {
        let mut expected = self.column_order.clone();
        let mut given = new_order.clone();
        expected.sort_unstable();
        given.sort_unstable();
        if expected != given {
            return Err(TableError::InvalidColumnOrder(new_order));
        }
        debug!("Column order {:?} -> {:?}", self.column_order, new_order);
        self.column_order = new_order;
        Ok(())
    }

    /// Applies `new_width` only above the minimum width. Returns whether it was applied.
    pub fn resize(&mut self, key: &str, new_width: i32) -> bool {
        if new_width <= i32::from(self.min_column_width) || !self.column_widths.contains_key(key) {
            return false;
        }
        let width = u16::try_from(new_width).unwrap_or(u16::MAX);
        self.column_widths.insert(key.to_string(), width);
        true
    }

    pub fn paginate(&mut self, page: usize) {
        self.current_page = page.max(1);
    }

    pub fn column_order(&self) -> &[String] {
        &self.column_order
    }

    pub fn column_width(&self, key: &str) -> u16 {
        self.column_widths.get(key).copied().unwrap_or(self.min_column_width)
    }

    pub fn sort_config(&self) -> Option<&SortConfig> {
        self.sort.as_ref()
    }

    pub fn filters(&self) -> &BTreeMap<String, String> {
        &self.filters
    }

    pub fn filter_value(&self, key: &str) -> &str {
        self.filters.get(key).map(|s| s.as_str()).unwrap_or("")
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("id", "ID"),
            ColumnDef::new("name", "Name"),
            ColumnDef::new("age", "Age"),
        ]
    }

    fn state() -> ViewState {
        ViewState::new(&columns(), &TableConfig::default())
    }

    #[test]
    fn initial_state_follows_columns() {
        let state = state();
        assert_eq!(state.column_order(), ["id", "name", "age"]);
        assert_eq!(state.column_width("name"), 150);
        assert_eq!(state.current_page(), 1);
        assert_eq!(state.page_size(), 5);
        assert!(state.sort_config().is_none());
        assert!(state.filters().is_empty());
    }

    #[test]
    fn sort_toggles_on_same_key_and_restarts_on_new_key() {
        let mut state = state();
        state.sort("age");
        assert_eq!(state.sort_config().unwrap().direction, SortDirection::Ascending);
        state.sort("age");
        assert_eq!(state.sort_config().unwrap().direction, SortDirection::Descending);
        state.sort("age");
        assert_eq!(state.sort_config().unwrap().direction, SortDirection::Ascending);
        state.sort("age");
        state.sort("name");
        let sort = state.sort_config().unwrap();
        assert_eq!(sort.key, "name");
        assert_eq!(sort.direction, SortDirection::Ascending);
    }

    #[test]
    fn empty_filter_clears_column() {
        let mut state = state();
        state.filter("name", "ro");
        assert_eq!(state.filter_value("name"), "ro");
        state.filter("name", "");
        assert!(state.filters().is_empty());
    }

    #[test]
    fn search_is_lower_cased() {
        let mut state = state();
        state.search("DeLhI");
        assert_eq!(state.search_term(), "delhi");
    }

    #[test]
    fn reorder_requires_permutation() {
        let mut state = state();
        assert!(state.reorder(vec!["age".into(), "id".into(), "name".into()]).is_ok());
        assert_eq!(state.column_order(), ["age", "id", "name"]);

        let missing = state.reorder(vec!["age".into(), "id".into()]);
        assert!(matches!(missing, Err(TableError::InvalidColumnOrder(_))));
        let duplicate = state.reorder(vec!["age".into(), "age".into(), "name".into()]);
        assert!(duplicate.is_err());
        assert_eq!(state.column_order(), ["age", "id", "name"]);
    }

    #[test]
    fn resize_rejects_widths_at_or_below_floor() {
        let mut state = state();
        assert!(!state.resize("id", 50));
        assert!(!state.resize("id", -20));
        assert_eq!(state.column_width("id"), 150);
        assert!(state.resize("id", 51));
        assert_eq!(state.column_width("id"), 51);
        assert!(!state.resize("unknown", 200));
    }

    #[test]
    fn paginate_never_goes_below_one() {
        let mut state = state();
        state.paginate(0);
        assert_eq!(state.current_page(), 1);
        state.paginate(3);
        assert_eq!(state.current_page(), 3);
    }

    #[test]
    fn value_display_and_blankness() {
        assert_eq!(Value::Int(35).to_string(), "35");
        assert_eq!(Value::Float(1.5).to_string(), "1.5");
        assert_eq!(Value::Null.to_string(), "");
        assert!(Value::Null.is_blank());
        assert!(Value::from("").is_blank());
        assert!(!Value::Int(0).is_blank());
    }
}
