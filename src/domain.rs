use std::fmt;
use std::io::Error;

use derive_setters::Setters;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;

pub const HELP_TEXT: &str = "\
Search & filter
  /        search all fields
  f        filter the selected column
  c        clear search and all filters
  Enter    keep input, Esc restores the previous value

Columns
  ←/→ h/l  select column
  s        sort selected column (asc/desc)
  H/L < >  move selected column left/right
  + -      widen/narrow selected column
  mouse    drag the ┃ handle to resize,
           click a title to sort

Pages
  n PgDn   next page
  p PgUp   previous page
  Home End first/last page

  ?        this help, Esc closes
  q        quit";

#[derive(Debug)]
pub enum TableError {
    IoError(Error),
    PolarsError(PolarsError),
    LoadingFailed(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
    InvalidColumnOrder(Vec<String>),
    LoggingFailed(String),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::IoError(e) => write!(f, "io error: {e}"),
            TableError::PolarsError(e) => write!(f, "polars error: {e}"),
            TableError::LoadingFailed(msg) => write!(f, "loading failed: {msg}"),
            TableError::FileNotFound => write!(f, "file not found"),
            TableError::PermissionDenied => write!(f, "permission denied"),
            TableError::UnknownFileType => write!(f, "unknown file type"),
            TableError::InvalidColumnOrder(order) => {
                write!(f, "{order:?} is not a permutation of the table columns")
            }
            TableError::LoggingFailed(msg) => write!(f, "could not set up logging: {msg}"),
        }
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TableError::IoError(e) => Some(e),
            TableError::PolarsError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<Error> for TableError {
    fn from(err: Error) -> Self {
        TableError::IoError(err)
    }
}

impl From<PolarsError> for TableError {
    fn from(err: PolarsError) -> Self {
        TableError::PolarsError(err)
    }
}

/// Runtime settings of the table, usually built from the command line.
#[derive(Debug, Clone, Setters)]
pub struct TableConfig {
    pub event_poll_time: u64,
    pub page_size: usize,
    pub default_column_width: u16,
    pub min_column_width: u16,
    #[setters(into)]
    pub heading: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            page_size: 5,
            default_column_width: 150,
            min_column_width: 50,
            heading: "User Table".to_string(),
        }
    }
}

/// What the command line input is currently editing.
#[derive(Debug, Clone, PartialEq)]
pub enum InputTarget {
    Search,
    Filter(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    Help,
    Exit,
    Search,
    Filter,
    ClearFilters,
    Sort,
    SelectNextColumn,
    SelectPreviousColumn,
    MoveColumnLeft,
    MoveColumnRight,
    WidenColumn,
    NarrowColumn,
    NextPage,
    PreviousPage,
    FirstPage,
    LastPage,
    Resize(u16, u16),
    MouseDown(u16, u16),
    MouseDrag(u16, u16),
    MouseUp(u16, u16),
    RawKey(KeyEvent),
}
