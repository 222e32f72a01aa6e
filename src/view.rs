use std::cmp::Ordering;

use rayon::prelude::*;
use tracing::trace;

use crate::table::{Record, SortConfig, SortDirection, Value, ViewState};

/// The filtered, sorted and paged subset of the data for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedView {
    /// Data indices of the rows on the current page, in display order.
    pub rows: Vec<usize>,
    pub filtered_count: usize,
    pub page: usize,
    pub total_pages: usize,
}

impl DerivedView {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

pub fn derive_view(data: &[Record], state: &ViewState) -> DerivedView {
    let filters: Vec<(&String, String)> = state
        .filters()
        .iter()
        .map(|(k, v)| (k, v.to_lowercase()))
        .collect();
    let term = state.search_term();

    // rayon keeps the input order when collecting into a Vec.
    let mut rows: Vec<usize> = (0..data.len())
        .into_par_iter()
        .filter(|&idx| matches_filters(&data[idx], &filters) && matches_search(&data[idx], term))
        .collect();

    if let Some(sort) = state.sort_config() {
        sort_rows(data, &mut rows, sort);
    }

    let filtered_count = rows.len();
    let page_size = state.page_size();
    let total_pages = filtered_count.div_ceil(page_size);
    let page = state.current_page().clamp(1, total_pages.max(1));

    let start = (page - 1) * page_size;
    let end = std::cmp::min(start + page_size, filtered_count);
    let rows = rows[start..end].to_vec();

    trace!(
        "Derived view: {} filtered rows, page {}/{}, showing {}",
        filtered_count,
        page,
        total_pages,
        rows.len()
    );
    DerivedView {
        rows,
        filtered_count,
        page,
        total_pages,
    }
}

// Every active column filter has to match. Blank fields are skipped.
fn matches_filters(record: &Record, filters: &[(&String, String)]) -> bool {
    filters.iter().all(|(key, needle)| match record.get(key) {
        Some(value) if !value.is_blank() => value.to_string().to_lowercase().contains(needle),
        _ => true,
    })
}

// At least one field has to contain the (already lower-cased) term.
fn matches_search(record: &Record, term: &str) -> bool {
    term.is_empty()
        || record
            .values()
            .filter(|v| !v.is_blank())
            .any(|v| v.to_string().to_lowercase().contains(term))
}

/// Stable sort of `rows` on the values of `sort.key`.
///
/// A column whose present values are all numbers is compared numerically,
/// any other column by its display strings. Blank values always go last.
pub fn sort_rows(data: &[Record], rows: &mut [usize], sort: &SortConfig) {
    let key = sort.key.as_str();
    let is_numeric = rows
        .iter()
        .filter_map(|&idx| data[idx].get(key))
        .filter(|v| !v.is_blank())
        .all(Value::is_numeric);
    trace!("Sorting {} rows on {key} (numeric: {is_numeric})", rows.len());

    rows.sort_by(|&a, &b| {
        let a_val = data[a].get(key).filter(|v| !v.is_blank());
        let b_val = data[b].get(key).filter(|v| !v.is_blank());
        match (a_val, b_val) {
            (Some(a_val), Some(b_val)) => {
                let ordering = compare_values(a_val, b_val, is_numeric);
                match sort.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
}

fn compare_values(a: &Value, b: &Value, is_numeric: bool) -> Ordering {
    if is_numeric && let (Some(a), Some(b)) = (a.as_f64(), b.as_f64()) {
        return a.total_cmp(&b);
    }
    match (a, b) {
        (Value::Text(a), Value::Text(b)) => a.cmp(b),
        _ => a.to_string().cmp(&b.to_string()),
    }
}
