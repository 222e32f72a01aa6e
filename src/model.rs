use ratatui::crossterm::event::KeyEvent;
use ratatui::layout::{Constraint, Layout, Rect};
use std::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::domain::{HELP_TEXT, InputTarget, Message, TableConfig, TableError};
use crate::inputter::{InputResult, Inputter};
use crate::resize::{DragSession, UNITS_PER_CELL, cells_for};
use crate::table::{ColumnDef, Record, SortDirection, ViewState};
use crate::view::{DerivedView, derive_view};

pub const SEARCH_PREFIX: &str = "Search: ";
pub const FILTER_PREFIX: &str = "⌕ ";
pub const PREVIOUS_LABEL: &str = "[ Previous ]";
pub const NEXT_LABEL: &str = "[ Next ]";
const PAGER_GAP: u16 = 2;

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    TABLE,
    CMDINPUT,
    POPUP,
}

/// Screen areas of the table, shared by rendering and mouse hit testing.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct UILayout {
    pub width: u16,
    pub height: u16,
    pub heading: Rect,
    pub search: Rect,
    pub header: Rect,
    pub filters: Rect,
    pub body: Rect,
    pub pager: Rect,
    pub statusline: Rect,
}

impl UILayout {
    pub fn from_values(ui_width: u16, ui_height: u16, page_size: usize) -> Self {
        let area = Rect::new(0, 0, ui_width, ui_height);
        let body_height = u16::try_from(page_size).unwrap_or(u16::MAX);
        let [heading, search, _, header, filters, body, pager, _, statusline] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(body_height),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .areas(area);

        let layout = UILayout {
            width: ui_width,
            height: ui_height,
            heading,
            search,
            header,
            filters,
            body,
            pager,
            statusline,
        };
        trace!("Build UILayout: {:?}", layout);
        layout
    }
}

/// Horizontal placement of one displayed column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpan {
    pub key: String,
    pub x: u16,
    /// Visible cells, already clipped to the screen.
    pub cells: u16,
    /// Last cell of the column, only when it is on screen.
    pub handle_x: Option<u16>,
}

impl ColumnSpan {
    /// Cells available for content, the handle excluded.
    pub fn content_cells(&self) -> u16 {
        match self.handle_x {
            Some(_) => self.cells.saturating_sub(1),
            None => self.cells,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PagerLayout {
    pub previous: Rect,
    pub label: Rect,
    pub next: Rect,
}

impl PagerLayout {
    fn new(area: Rect, label: &str) -> Self {
        let clip = |r: Rect| r.intersection(area);
        let previous = Rect::new(area.x, area.y, PREVIOUS_LABEL.chars().count() as u16, 1);
        let label_rect = Rect::new(
            previous.right() + PAGER_GAP,
            area.y,
            label.chars().count() as u16,
            1,
        );
        let next = Rect::new(
            label_rect.right() + PAGER_GAP,
            area.y,
            NEXT_LABEL.chars().count() as u16,
            1,
        );
        PagerLayout {
            previous: clip(previous),
            label: clip(label_rect),
            next: clip(next),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HitTarget {
    SearchBox,
    SortTrigger(String),
    ResizeHandle(String),
    FilterBox(String),
    PreviousPage,
    NextPage,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderView {
    pub title: String,
    pub sort: Option<SortDirection>,
    pub filter: String,
    pub span: ColumnSpan,
    pub selected: bool,
    pub dragging: bool,
}

/// Everything the UI needs to draw one frame.
pub struct UIData {
    pub heading: String,
    pub search: String,
    pub columns: Vec<HeaderView>,
    pub rows: Vec<Vec<String>>,
    pub page_label: String,
    pub has_previous: bool,
    pub has_next: bool,
    pub pager: PagerLayout,
    pub layout: UILayout,
    pub input_target: Option<InputTarget>,
    pub cursor: Option<(u16, u16)>,
    pub show_popup: bool,
    pub popup_message: String,
    pub status_message: String,
    pub last_status_message_update: Instant,
}

impl UIData {
    pub fn empty() -> Self {
        UIData {
            heading: String::new(),
            search: String::new(),
            columns: Vec::new(),
            rows: Vec::new(),
            page_label: String::new(),
            has_previous: false,
            has_next: false,
            pager: PagerLayout::default(),
            layout: UILayout::default(),
            input_target: None,
            cursor: None,
            show_popup: false,
            popup_message: String::new(),
            status_message: String::new(),
            last_status_message_update: Instant::now(),
        }
    }
}

pub struct Model {
    config: TableConfig,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    data: Vec<Record>,
    columns: Vec<ColumnDef>,
    state: ViewState,
    view: DerivedView,
    selected_column: usize,
    search_input: String,
    drag: Option<DragSession>,
    uilayout: UILayout,
    uidata: UIData,
    input: Inputter,
    input_target: Option<InputTarget>,
    input_snapshot: String,
    last_input: InputResult,
    status_message: String,
    last_status_message_update: Instant,
}

impl Model {
    pub fn init(
        config: &TableConfig,
        data: Vec<Record>,
        columns: Vec<ColumnDef>,
        ui_width: u16,
        ui_height: u16,
    ) -> Self {
        let state = ViewState::new(&columns, config);
        let view = derive_view(&data, &state);
        let mut model = Self {
            config: config.clone(),
            status: Status::READY,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            data,
            columns,
            state,
            view,
            selected_column: 0,
            search_input: String::new(),
            drag: None,
            uilayout: UILayout::from_values(ui_width, ui_height, config.page_size),
            uidata: UIData::empty(),
            input: Inputter::default(),
            input_target: None,
            input_snapshot: String::new(),
            last_input: InputResult::default(),
            status_message: String::new(),
            last_status_message_update: Instant::now(),
        };
        info!(
            "Table with {} rows and {} columns",
            model.data.len(),
            model.columns.len()
        );
        model.set_status_message("Press ? for help");
        model.refresh();
        model
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), TableError> {
        let Some(msg) = message else {
            return Ok(());
        };
        trace!("Update: Modus {:?}, Message {:?}", self.modus, msg);

        // A running drag gets its move and release events in every mode.
        match msg {
            Message::MouseDrag(x, y) if self.drag.is_some() => {
                self.mouse_drag(x, y);
                return Ok(());
            }
            Message::MouseUp(_, _) => {
                self.mouse_up();
                return Ok(());
            }
            _ => (),
        }

        match self.modus {
            Modus::TABLE => match msg {
                Message::Quit => self.quit(),
                Message::Help => self.show_help(),
                Message::Search => self.enter_input(InputTarget::Search),
                Message::Filter => {
                    if let Some(key) = self.selected_key() {
                        self.enter_input(InputTarget::Filter(key));
                    }
                }
                Message::ClearFilters => self.clear_filters(),
                Message::Sort => {
                    if let Some(key) = self.selected_key() {
                        self.sort(&key);
                    }
                }
                Message::SelectNextColumn => self.select_column(self.selected_column + 1),
                Message::SelectPreviousColumn => {
                    self.select_column(self.selected_column.saturating_sub(1))
                }
                Message::MoveColumnLeft => self.move_selected_column(-1),
                Message::MoveColumnRight => self.move_selected_column(1),
                Message::WidenColumn => self.step_selected_width(UNITS_PER_CELL),
                Message::NarrowColumn => self.step_selected_width(-UNITS_PER_CELL),
                Message::NextPage => self.next_page(),
                Message::PreviousPage => self.previous_page(),
                Message::FirstPage => self.paginate(1),
                Message::LastPage => self.paginate(self.view.total_pages),
                Message::Resize(width, height) => self.ui_resize(width, height),
                Message::MouseDown(x, y) => self.mouse_down(x, y),
                Message::MouseDrag(_, _)
                | Message::MouseUp(_, _)
                | Message::Exit
                | Message::RawKey(_) => (),
            },
            Modus::CMDINPUT => match msg {
                Message::RawKey(key) => self.raw_input(key),
                Message::MouseDown(x, y) => {
                    self.finish_input();
                    self.mouse_down(x, y);
                }
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
            Modus::POPUP => match msg {
                Message::Quit => self.quit(),
                Message::Exit | Message::Help => self.exit(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
        }
        Ok(())
    }

    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::CMDINPUT
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    pub fn quit(&mut self) {
        if self.drag.take().is_some() {
            debug!("Quitting during a column drag");
        }
        self.status = Status::QUITTING;
    }

    // ---------------------------- Table operations ---------------------------- //

    pub fn sort(&mut self, key: &str) {
        self.state.sort(key);
        if let Some(sort) = self.state.sort_config() {
            let message = format!("Sorted by {} ({})", self.title_of(key), sort.direction.label());
            self.set_status_message(message);
        }
        self.refresh();
    }

    pub fn filter(&mut self, key: &str, value: &str) {
        self.state.filter(key, value);
        self.refresh();
        self.report_matches();
    }

    pub fn search(&mut self, value: &str) {
        self.search_input = value.to_string();
        self.state.search(value);
        self.refresh();
        self.report_matches();
    }

    pub fn reorder(&mut self, new_order: Vec<String>) -> Result<(), TableError> {
        let selected = self.selected_key();
        self.state.reorder(new_order)?;
        if let Some(key) = selected {
            self.selected_column = self.position_of(&key).unwrap_or(0);
        }
        self.refresh();
        Ok(())
    }

    /// Applies `new_width` when it is above the minimum column width.
    pub fn resize_column(&mut self, key: &str, new_width: i32) -> bool {
        let applied = self.state.resize(key, new_width);
        if applied {
            self.refresh();
        }
        applied
    }

    pub fn paginate(&mut self, page: usize) {
        self.state.paginate(page);
        self.refresh();
    }

    fn next_page(&mut self) {
        if self.view.has_next() {
            self.paginate(self.view.page + 1);
        }
    }

    fn previous_page(&mut self) {
        if self.view.has_previous() {
            self.paginate(self.view.page - 1);
        }
    }

    fn clear_filters(&mut self) {
        self.state.clear_filters();
        self.search_input.clear();
        self.refresh();
        self.set_status_message("Cleared search and filters");
    }

    fn select_column(&mut self, idx: usize) {
        let last = self.state.column_order().len().saturating_sub(1);
        self.selected_column = idx.min(last);
        self.update_uidata();
    }

    fn move_selected_column(&mut self, step: isize) {
        let order = self.state.column_order();
        let target = self.selected_column.saturating_add_signed(step);
        if target >= order.len() || target == self.selected_column {
            return;
        }
        let mut new_order = order.to_vec();
        new_order.swap(self.selected_column, target);
        if let Err(e) = self.reorder(new_order) {
            warn!("Could not move column: {e}");
            self.set_status_message(format!("Could not move column: {e}"));
        }
    }

    fn step_selected_width(&mut self, delta: i32) {
        let Some(key) = self.selected_key() else {
            return;
        };
        let width = i32::from(self.state.column_width(&key)) + delta;
        if !self.resize_column(&key, width) {
            self.set_status_message(format!(
                "Columns need to be wider than {}",
                self.config.min_column_width
            ));
        }
    }

    // ------------------------------ Mouse handling ------------------------------ //

    fn mouse_down(&mut self, x: u16, y: u16) {
        // A missed release must not keep an old drag alive.
        self.drag = None;

        let Some(target) = self.hit_test(x, y) else {
            return;
        };
        trace!("Mouse down at {x}:{y} on {target:?}");
        match target {
            HitTarget::ResizeHandle(key) => {
                self.select_key(&key);
                let width = self.state.column_width(&key);
                self.drag = Some(DragSession::start(&key, x, width));
                self.update_uidata();
            }
            HitTarget::SortTrigger(key) => {
                self.select_key(&key);
                self.sort(&key);
            }
            HitTarget::FilterBox(key) => {
                self.select_key(&key);
                self.enter_input(InputTarget::Filter(key));
            }
            HitTarget::SearchBox => self.enter_input(InputTarget::Search),
            HitTarget::PreviousPage => self.previous_page(),
            HitTarget::NextPage => self.next_page(),
        }
    }

    fn mouse_drag(&mut self, x: u16, _y: u16) {
        let Some(drag) = &self.drag else {
            return;
        };
        let key = drag.key().to_string();
        let width = drag.width_at(x);
        self.resize_column(&key, width);
    }

    fn mouse_up(&mut self) {
        if let Some(drag) = self.drag.take() {
            let width = self.state.column_width(drag.key());
            self.set_status_message(format!("{} is {} wide", self.title_of(drag.key()), width));
            self.update_uidata();
        }
    }

    /// Which control is drawn at `x`:`y`.
    pub fn hit_test(&self, x: u16, y: u16) -> Option<HitTarget> {
        let layout = &self.uilayout;
        let inside = |r: &Rect| x >= r.x && x < r.right() && y >= r.y && y < r.bottom();

        if inside(&layout.search) {
            return Some(HitTarget::SearchBox);
        }
        if inside(&layout.header) || inside(&layout.filters) {
            let span = self
                .column_spans()
                .into_iter()
                .find(|s| x >= s.x && x < s.x + s.cells)?;
            if y == layout.filters.y {
                return Some(HitTarget::FilterBox(span.key));
            }
            if span.handle_x == Some(x) {
                return Some(HitTarget::ResizeHandle(span.key));
            }
            return Some(HitTarget::SortTrigger(span.key));
        }
        if inside(&layout.pager) {
            let pager = &self.uidata.pager;
            if inside(&pager.previous) && self.view.has_previous() {
                return Some(HitTarget::PreviousPage);
            }
            if inside(&pager.next) && self.view.has_next() {
                return Some(HitTarget::NextPage);
            }
        }
        None
    }

    /// Columns in display order, laid out left to right and clipped to the screen.
    pub fn column_spans(&self) -> Vec<ColumnSpan> {
        let area = self.uilayout.header;
        let mut spans = Vec::new();
        let mut x = area.x;
        for key in self.state.column_order() {
            if x >= area.right() {
                break;
            }
            let cells = cells_for(self.state.column_width(key));
            let visible = cells.min(area.right() - x);
            spans.push(ColumnSpan {
                key: key.clone(),
                x,
                cells: visible,
                handle_x: (visible == cells).then(|| x + cells - 1),
            });
            x = x.saturating_add(cells);
        }
        spans
    }

    // ------------------------------ Input handling ------------------------------ //

    fn enter_input(&mut self, target: InputTarget) {
        trace!("Entering input mode for {:?}", target);
        let current = match &target {
            InputTarget::Search => self.search_input.clone(),
            InputTarget::Filter(key) => self.state.filter_value(key).to_string(),
        };
        self.previous_modus = self.modus;
        self.modus = Modus::CMDINPUT;
        self.input.set(&current);
        self.input_snapshot = current;
        self.last_input = self.input.get();
        self.input_target = Some(target);
        self.set_status_message("Enter keeps the input, Esc restores it");
        self.update_uidata();
    }

    fn raw_input(&mut self, key: KeyEvent) {
        let previous = self.last_input.input.clone();
        self.last_input = self.input.read(key);

        if self.last_input.canceled {
            let snapshot = self.input_snapshot.clone();
            self.apply_input(&snapshot);
            self.leave_input();
        } else {
            if self.last_input.input != previous {
                let value = self.last_input.input.clone();
                self.apply_input(&value);
            }
            if self.last_input.finished {
                self.leave_input();
            }
        }
        self.update_uidata();
    }

    fn finish_input(&mut self) {
        if self.modus == Modus::CMDINPUT {
            self.leave_input();
        }
    }

    fn apply_input(&mut self, value: &str) {
        match self.input_target.clone() {
            Some(InputTarget::Search) => self.search(value),
            Some(InputTarget::Filter(key)) => self.filter(&key, value),
            None => (),
        }
    }

    fn leave_input(&mut self) {
        trace!("Leaving input mode with {:?}", self.last_input.input);
        self.modus = self.previous_modus;
        self.previous_modus = Modus::CMDINPUT;
        self.input_target = None;
        self.input.clear();
        self.last_input = InputResult::default();
        self.update_uidata();
    }

    // ------------------------------ Misc handling ------------------------------ //

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
        self.uidata.popup_message = HELP_TEXT.to_string();
        self.uidata.show_popup = true;
    }

    fn exit(&mut self) {
        if self.modus == Modus::POPUP {
            trace!("Close popup ...");
            self.modus = self.previous_modus;
            self.previous_modus = Modus::POPUP;
            self.uidata.show_popup = false;
        }
    }

    fn ui_resize(&mut self, width: u16, height: u16) {
        trace!(
            "UI was resized! w:{}->{}, h:{}->{}",
            self.uilayout.width, width, self.uilayout.height, height
        );
        self.uilayout = UILayout::from_values(width, height, self.config.page_size);
        self.update_uidata();
    }

    fn report_matches(&mut self) {
        let message = format!(
            "{} of {} rows match",
            self.view.filtered_count,
            self.data.len()
        );
        self.set_status_message(message);
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
        self.uidata.status_message = self.status_message.clone();
        self.uidata.last_status_message_update = self.last_status_message_update;
    }

    fn selected_key(&self) -> Option<String> {
        self.state.column_order().get(self.selected_column).cloned()
    }

    fn select_key(&mut self, key: &str) {
        if let Some(idx) = self.position_of(key) {
            self.selected_column = idx;
        }
    }

    fn position_of(&self, key: &str) -> Option<usize> {
        self.state.column_order().iter().position(|k| k == key)
    }

    fn title_of(&self, key: &str) -> String {
        self.columns
            .iter()
            .find(|c| c.key == key)
            .map(|c| c.title.clone())
            .unwrap_or_else(|| key.to_string())
    }

    // ------------------------------ Derived data ------------------------------ //

    /// Recomputes the visible rows from the data and the view state.
    fn refresh(&mut self) {
        let start_time = Instant::now();
        self.view = derive_view(&self.data, &self.state);
        if self.view.page != self.state.current_page() {
            debug!(
                "Page {} out of range, showing {}",
                self.state.current_page(),
                self.view.page
            );
            self.state.paginate(self.view.page);
        }
        trace!("Refresh took {}us", start_time.elapsed().as_micros());
        self.update_uidata();
    }

    fn update_uidata(&mut self) {
        let spans = self.column_spans();
        let sort = self.state.sort_config();
        let dragging = self.drag.as_ref().map(|d| d.key());

        let columns: Vec<HeaderView> = spans
            .into_iter()
            .enumerate()
            .map(|(idx, span)| HeaderView {
                title: self.title_of(&span.key),
                sort: sort.filter(|s| s.key == span.key).map(|s| s.direction),
                filter: self.state.filter_value(&span.key).to_string(),
                selected: idx == self.selected_column,
                dragging: dragging == Some(span.key.as_str()),
                span,
            })
            .collect();

        let rows = self
            .view
            .rows
            .iter()
            .map(|&ridx| {
                columns
                    .iter()
                    .map(|c| self.data[ridx].display(&c.span.key))
                    .collect()
            })
            .collect();

        let page_label = format!(
            "Page {} of {}",
            self.view.page,
            self.view.total_pages.max(1)
        );
        let pager = PagerLayout::new(self.uilayout.pager, &page_label);

        let cursor = match &self.input_target {
            Some(InputTarget::Search) => {
                let offset = (SEARCH_PREFIX.chars().count() + self.last_input.cursor_pos) as u16;
                Some((
                    self.uilayout.search.x
                        + offset.min(self.uilayout.search.width.saturating_sub(1)),
                    self.uilayout.search.y,
                ))
            }
            Some(InputTarget::Filter(key)) => columns.iter().find(|c| &c.span.key == key).map(|c| {
                let offset = (FILTER_PREFIX.chars().count() + self.last_input.cursor_pos) as u16;
                (
                    c.span.x + offset.min(c.span.content_cells().saturating_sub(1)),
                    self.uilayout.filters.y,
                )
            }),
            None => None,
        };

        self.uidata = UIData {
            heading: self.config.heading.clone(),
            search: self.search_input.clone(),
            columns,
            rows,
            page_label,
            has_previous: self.view.has_previous(),
            has_next: self.view.has_next(),
            pager,
            layout: self.uilayout.clone(),
            input_target: self.input_target.clone(),
            cursor,
            show_popup: self.modus == Modus::POPUP,
            popup_message: self.uidata.popup_message.clone(),
            status_message: self.status_message.clone(),
            last_status_message_update: self.last_status_message_update,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{user_columns, users_fixture};
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};
    use std::sync::{Arc, Mutex};

    fn model() -> Model {
        Model::init(
            &TableConfig::default(),
            users_fixture(),
            user_columns(),
            120,
            24,
        )
    }

    fn send(model: &mut Model, msg: Message) {
        model.update(Some(msg)).unwrap();
    }

    fn type_keys(model: &mut Model, s: &str) {
        for c in s.chars() {
            send(model, Message::RawKey(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)));
        }
    }

    fn key(model: &mut Model, code: KeyCode) {
        send(model, Message::RawKey(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    fn first_cells(model: &Model, column: usize) -> Vec<String> {
        model.get_uidata().rows.iter().map(|r| r[column].clone()).collect()
    }

    #[test]
    fn layout_places_rows_top_to_bottom() {
        let layout = UILayout::from_values(120, 24, 5);
        assert_eq!(layout.heading.y, 0);
        assert_eq!(layout.search.y, 1);
        assert_eq!(layout.header.y, 3);
        assert_eq!(layout.filters.y, 4);
        assert_eq!((layout.body.y, layout.body.height), (5, 5));
        assert_eq!(layout.pager.y, 10);
        assert_eq!(layout.statusline.y, 23);
    }

    #[test]
    fn column_spans_follow_widths_and_order() {
        let model = model();
        let spans = model.column_spans();
        let keys: Vec<&str> = spans.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, ["id", "name", "age", "city"]);
        assert_eq!(spans[0].x, 0);
        assert_eq!(spans[0].cells, 15);
        assert_eq!(spans[0].handle_x, Some(14));
        assert_eq!(spans[1].x, 15);
    }

    #[test]
    fn narrow_screen_clips_last_column() {
        let model = Model::init(&TableConfig::default(), users_fixture(), user_columns(), 40, 24);
        let spans = model.column_spans();
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[2].cells, 10);
        assert_eq!(spans[2].handle_x, None);
    }

    #[test]
    fn first_page_and_pager_state() {
        let mut model = model();
        let uidata = model.get_uidata();
        assert_eq!(uidata.rows.len(), 5);
        assert_eq!(first_cells(&model, 1), ["Ajay", "virat", "Rohit", "sachin", "gill"]);
        assert_eq!(uidata.page_label, "Page 1 of 2");
        assert!(!uidata.has_previous);
        assert!(uidata.has_next);

        send(&mut model, Message::NextPage);
        let uidata = model.get_uidata();
        assert_eq!(uidata.page_label, "Page 2 of 2");
        assert_eq!(first_cells(&model, 0), ["6", "7", "8", "9", "10"]);
        assert!(uidata.has_previous);
        assert!(!uidata.has_next);

        // Next is disabled on the last page.
        send(&mut model, Message::NextPage);
        assert_eq!(model.view.page, 2);
        send(&mut model, Message::FirstPage);
        assert_eq!(model.view.page, 1);
        send(&mut model, Message::PreviousPage);
        assert_eq!(model.view.page, 1);
    }

    #[test]
    fn pager_buttons_are_clickable_only_when_enabled() {
        let mut model = model();
        let pager = model.get_uidata().pager.clone();
        assert_eq!(model.hit_test(pager.previous.x, pager.previous.y), None);
        assert_eq!(
            model.hit_test(pager.next.x + 1, pager.next.y),
            Some(HitTarget::NextPage)
        );

        send(&mut model, Message::MouseDown(pager.next.x + 1, pager.next.y));
        send(&mut model, Message::MouseUp(pager.next.x + 1, pager.next.y));
        assert_eq!(model.view.page, 2);

        let pager = model.get_uidata().pager.clone();
        assert_eq!(model.hit_test(pager.next.x, pager.next.y), None);
        assert_eq!(
            model.hit_test(pager.previous.x, pager.previous.y),
            Some(HitTarget::PreviousPage)
        );
    }

    #[test]
    fn hit_test_finds_header_controls() {
        let model = model();
        assert_eq!(model.hit_test(3, 1), Some(HitTarget::SearchBox));
        assert_eq!(model.hit_test(2, 3), Some(HitTarget::SortTrigger("id".into())));
        assert_eq!(model.hit_test(14, 3), Some(HitTarget::ResizeHandle("id".into())));
        assert_eq!(model.hit_test(16, 4), Some(HitTarget::FilterBox("name".into())));
        assert_eq!(model.hit_test(100, 3), None);
        assert_eq!(model.hit_test(2, 6), None);
    }

    #[test]
    fn clicking_a_title_toggles_sort() {
        let mut model = model();
        // "age" starts at x=30.
        send(&mut model, Message::MouseDown(31, 3));
        send(&mut model, Message::MouseUp(31, 3));
        assert_eq!(first_cells(&model, 1)[..2], ["gill", "Ajay"]);
        assert_eq!(model.get_uidata().columns[2].sort, Some(SortDirection::Ascending));

        send(&mut model, Message::MouseDown(31, 3));
        assert_eq!(model.get_uidata().columns[2].sort, Some(SortDirection::Descending));
        assert_eq!(first_cells(&model, 1)[..2], ["virat", "sachin"]);
    }

    #[test]
    fn keyboard_sort_uses_selected_column() {
        let mut model = model();
        send(&mut model, Message::SelectNextColumn);
        send(&mut model, Message::Sort);
        let sort = model.state.sort_config().unwrap();
        assert_eq!(sort.key, "name");
        assert_eq!(sort.direction, SortDirection::Ascending);
        assert_eq!(model.get_uidata().status_message, "Sorted by Name (asc)");
    }

    #[test]
    fn dragging_a_handle_resizes_with_a_floor() {
        let mut model = model();
        // Handle of "id" is the 15th cell.
        send(&mut model, Message::MouseDown(14, 3));
        assert!(model.is_dragging());
        send(&mut model, Message::MouseDrag(17, 3));
        assert_eq!(model.state.column_width("id"), 180);

        // 150 - 10 cells * 10 = 50 is at the floor and rejected.
        send(&mut model, Message::MouseDrag(4, 3));
        assert_eq!(model.state.column_width("id"), 180);
        send(&mut model, Message::MouseDrag(5, 3));
        assert_eq!(model.state.column_width("id"), 60);

        send(&mut model, Message::MouseUp(5, 3));
        assert!(!model.is_dragging());
        send(&mut model, Message::MouseDrag(30, 3));
        assert_eq!(model.state.column_width("id"), 60);
    }

    #[test]
    fn new_mouse_down_and_quit_release_the_drag() {
        let mut model = model();
        send(&mut model, Message::MouseDown(14, 3));
        assert!(model.is_dragging());
        send(&mut model, Message::MouseDown(50, 10));
        assert!(!model.is_dragging());

        send(&mut model, Message::MouseDown(14, 3));
        send(&mut model, Message::Quit);
        assert!(!model.is_dragging());
        assert_eq!(model.status, Status::QUITTING);
    }

    #[test]
    fn release_during_input_or_help_ends_the_drag() {
        let mut model = model();
        send(&mut model, Message::MouseDown(14, 3));
        send(&mut model, Message::Search);
        send(&mut model, Message::MouseUp(14, 3));
        assert!(!model.is_dragging());
        key(&mut model, KeyCode::Enter);
        send(&mut model, Message::MouseDrag(20, 3));
        assert_eq!(model.state.column_width("id"), 150);

        send(&mut model, Message::MouseDown(14, 3));
        send(&mut model, Message::Help);
        send(&mut model, Message::MouseUp(14, 3));
        assert!(!model.is_dragging());
        send(&mut model, Message::Exit);
        send(&mut model, Message::MouseDrag(25, 3));
        assert_eq!(model.state.column_width("id"), 150);
    }

    #[test]
    fn drag_keeps_resizing_while_help_is_open() {
        let mut model = model();
        send(&mut model, Message::MouseDown(14, 3));
        send(&mut model, Message::Help);
        send(&mut model, Message::MouseDrag(16, 3));
        assert_eq!(model.state.column_width("id"), 170);
        assert!(model.get_uidata().show_popup);
        send(&mut model, Message::MouseUp(16, 3));
        assert!(!model.is_dragging());
        assert!(model.get_uidata().show_popup);
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn dropping_the_model_releases_the_drag() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut model = model();
            send(&mut model, Message::MouseDown(14, 3));
            assert!(model.is_dragging());
            drop(model);
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Drag on id started"));
        assert!(output.contains("Drag on id released"));
    }

    #[test]
    fn search_cursor_stays_on_screen() {
        let mut model = Model::init(&TableConfig::default(), users_fixture(), user_columns(), 40, 24);
        send(&mut model, Message::Search);
        type_keys(&mut model, &"x".repeat(60));
        let (x, y) = model.get_uidata().cursor.unwrap();
        assert_eq!((x, y), (39, 1));
    }

    #[test]
    fn keyboard_resize_respects_floor() {
        let mut model = model();
        for _ in 0..9 {
            send(&mut model, Message::NarrowColumn);
        }
        assert_eq!(model.state.column_width("id"), 60);
        send(&mut model, Message::NarrowColumn);
        assert_eq!(model.state.column_width("id"), 60);
        send(&mut model, Message::WidenColumn);
        assert_eq!(model.state.column_width("id"), 70);
    }

    #[test]
    fn search_input_applies_live_and_escape_restores() {
        let mut model = model();
        send(&mut model, Message::Search);
        assert!(model.raw_keyevents());
        type_keys(&mut model, "35");
        assert_eq!(first_cells(&model, 1), ["virat", "sachin"]);
        assert_eq!(model.get_uidata().search, "35");
        key(&mut model, KeyCode::Enter);
        assert!(!model.raw_keyevents());
        assert_eq!(model.state.search_term(), "35");

        send(&mut model, Message::Search);
        type_keys(&mut model, "x");
        assert!(model.get_uidata().rows.is_empty());
        key(&mut model, KeyCode::Esc);
        assert_eq!(model.state.search_term(), "35");
        assert_eq!(first_cells(&model, 1), ["virat", "sachin"]);
    }

    #[test]
    fn filter_input_targets_clicked_column() {
        let mut model = model();
        // Filter box of "city" starts at x=45.
        send(&mut model, Message::MouseDown(46, 4));
        assert!(model.raw_keyevents());
        type_keys(&mut model, "DELHI");
        key(&mut model, KeyCode::Enter);
        assert_eq!(model.state.filter_value("city"), "DELHI");
        assert_eq!(first_cells(&model, 1), ["virat", "Jadeja"]);
        assert_eq!(model.get_uidata().page_label, "Page 1 of 1");
        assert!(!model.get_uidata().has_next);

        send(&mut model, Message::ClearFilters);
        assert_eq!(model.view.filtered_count, 10);
    }

    #[test]
    fn filtering_on_a_later_page_clamps_the_page() {
        let mut model = model();
        send(&mut model, Message::LastPage);
        assert_eq!(model.view.page, 2);
        model.filter("city", "delhi");
        assert_eq!(model.view.page, 1);
        assert_eq!(model.state.current_page(), 1);
    }

    #[test]
    fn moving_columns_reorders_header_and_body() {
        let mut model = model();
        send(&mut model, Message::MoveColumnRight);
        assert_eq!(model.state.column_order(), ["name", "id", "age", "city"]);
        let uidata = model.get_uidata();
        assert_eq!(uidata.columns[0].title, "Name");
        assert!(uidata.columns[1].selected);
        assert_eq!(uidata.rows[0][..2], ["Ajay", "1"]);

        let rejected = model.reorder(vec!["name".into()]);
        assert!(rejected.is_err());
        assert_eq!(model.state.column_order().len(), 4);
    }

    #[test]
    fn help_popup_opens_and_closes() {
        let mut model = model();
        send(&mut model, Message::Help);
        assert!(model.get_uidata().show_popup);
        send(&mut model, Message::Sort);
        assert!(model.state.sort_config().is_none());
        send(&mut model, Message::Exit);
        assert!(!model.get_uidata().show_popup);
    }
}
