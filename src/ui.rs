use std::time::Duration;

use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Constraint, Flex, Layout},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph, Widget},
};

use crate::domain::InputTarget;
use crate::model::{
    FILTER_PREFIX, HeaderView, Model, NEXT_LABEL, PREVIOUS_LABEL, SEARCH_PREFIX, UIData,
};
use crate::table::SortDirection;

const STATUS_MESSAGE_TIMEOUT: Duration = Duration::from_secs(5);
const HANDLE: &str = "┃";
const SEPARATOR: &str = "│";

const HEADER_STYLE: Style = Style::new().fg(Color::Yellow).add_modifier(Modifier::BOLD);
const SELECTED_STYLE: Style = Style::new().fg(Color::Black).bg(Color::Yellow);
const HANDLE_STYLE: Style = Style::new().fg(Color::DarkGray);
const DRAG_STYLE: Style = Style::new().fg(Color::LightCyan).add_modifier(Modifier::BOLD);
const PLACEHOLDER_STYLE: Style = Style::new().fg(Color::DarkGray).add_modifier(Modifier::ITALIC);
const DISABLED_STYLE: Style = Style::new().fg(Color::DarkGray);
const ENABLED_STYLE: Style = Style::new().fg(Color::LightBlue).add_modifier(Modifier::BOLD);

#[derive(Debug)]
pub struct TableUI {
    status_timeout: Duration,
}

impl TableUI {
    pub fn new() -> Self {
        Self {
            status_timeout: STATUS_MESSAGE_TIMEOUT,
        }
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let uidata = model.get_uidata();
        let buf = frame.buffer_mut();

        Self::draw_heading(uidata, buf);
        Self::draw_search(uidata, buf);
        Self::draw_header(uidata, buf);
        Self::draw_filters(uidata, buf);
        Self::draw_body(uidata, buf);
        Self::draw_pager(uidata, buf);
        self.draw_statusline(uidata, buf);

        if uidata.show_popup {
            Self::draw_popup(&uidata.popup_message, frame);
        } else if let Some(cursor) = uidata.cursor {
            frame.set_cursor_position(cursor);
        }
    }

    fn draw_heading(uidata: &UIData, buf: &mut Buffer) {
        let area = uidata.layout.heading;
        let line = Line::from(vec![
            uidata.heading.as_str().bold(),
            "  ".into(),
            "? help  q quit".dark_gray(),
        ]);
        line.render(area, buf);
    }

    fn draw_search(uidata: &UIData, buf: &mut Buffer) {
        let area = uidata.layout.search;
        let active = uidata.input_target == Some(InputTarget::Search);
        let prefix_style = if active { SELECTED_STYLE } else { HEADER_STYLE };
        let text = if uidata.search.is_empty() && !active {
            Span::styled("Search Table", PLACEHOLDER_STYLE)
        } else {
            Span::raw(uidata.search.as_str())
        };
        Line::from(vec![Span::styled(SEARCH_PREFIX, prefix_style), text]).render(area, buf);
    }

    fn draw_header(uidata: &UIData, buf: &mut Buffer) {
        let y = uidata.layout.header.y;
        for column in &uidata.columns {
            let indicator = match column.sort {
                Some(SortDirection::Ascending) => "▲",
                Some(SortDirection::Descending) => "▼",
                None => "⇅",
            };
            let width = column.span.content_cells() as usize;
            let title = get_visible_name(&column.title, width.saturating_sub(2));
            let style = if column.selected { SELECTED_STYLE } else { HEADER_STYLE };
            let (x, _) = buf.set_stringn(column.span.x, y, &title, width, style);
            if width > title.chars().count() + 1 {
                buf.set_stringn(x + 1, y, indicator, 1, style);
            }
            Self::draw_handle(column, y, buf, HANDLE);
        }
    }

    fn draw_filters(uidata: &UIData, buf: &mut Buffer) {
        let y = uidata.layout.filters.y;
        for column in &uidata.columns {
            let width = column.span.content_cells() as usize;
            let editing = matches!(
                &uidata.input_target,
                Some(InputTarget::Filter(key)) if key == &column.span.key
            );
            let (x, _) = buf.set_stringn(
                column.span.x,
                y,
                FILTER_PREFIX,
                width,
                if editing { SELECTED_STYLE } else { HANDLE_STYLE },
            );
            let remaining = width.saturating_sub(FILTER_PREFIX.chars().count());
            if column.filter.is_empty() && !editing {
                let placeholder = format!("Filter {}", column.title);
                let placeholder = get_visible_name(&placeholder, remaining);
                buf.set_stringn(x, y, placeholder, remaining, PLACEHOLDER_STYLE);
            } else {
                let filter = get_visible_name(&column.filter, remaining);
                buf.set_stringn(x, y, filter, remaining, Style::new());
            }
            Self::draw_handle(column, y, buf, SEPARATOR);
        }
    }

    fn draw_body(uidata: &UIData, buf: &mut Buffer) {
        let area = uidata.layout.body;
        for (ridx, row) in uidata.rows.iter().enumerate().take(area.height as usize) {
            let y = area.y + ridx as u16;
            for (column, cell) in uidata.columns.iter().zip(row) {
                let width = column.span.content_cells() as usize;
                // Leave one cell of air before the separator.
                let text = get_visible_name(cell, width.saturating_sub(1));
                buf.set_stringn(column.span.x, y, text, width, Style::new());
                Self::draw_handle(column, y, buf, SEPARATOR);
            }
        }
    }

    fn draw_handle(column: &HeaderView, y: u16, buf: &mut Buffer, symbol: &str) {
        if let Some(x) = column.span.handle_x {
            let style = if column.dragging { DRAG_STYLE } else { HANDLE_STYLE };
            buf.set_stringn(x, y, symbol, 1, style);
        }
    }

    fn draw_pager(uidata: &UIData, buf: &mut Buffer) {
        let pager = &uidata.pager;
        let style = |enabled: bool| if enabled { ENABLED_STYLE } else { DISABLED_STYLE };
        Span::styled(PREVIOUS_LABEL, style(uidata.has_previous)).render(pager.previous, buf);
        Span::raw(uidata.page_label.as_str()).render(pager.label, buf);
        Span::styled(NEXT_LABEL, style(uidata.has_next)).render(pager.next, buf);
    }

    fn draw_statusline(&self, uidata: &UIData, buf: &mut Buffer) {
        let area = uidata.layout.statusline;
        let fresh = uidata.last_status_message_update.elapsed() < self.status_timeout;
        if fresh || uidata.input_target.is_some() {
            Span::styled(uidata.status_message.as_str(), Style::new().fg(Color::Gray))
                .render(area, buf);
        }
    }

    fn draw_popup(message: &str, frame: &mut Frame) {
        let lines: Vec<Line> = message.lines().map(Line::from).collect();
        let height = lines.len() as u16 + 2;
        let width = lines.iter().map(|l| l.width()).max().unwrap_or(0) as u16 + 4;

        let [area] = Layout::vertical([Constraint::Length(height)])
            .flex(Flex::Center)
            .areas(frame.area());
        let [area] = Layout::horizontal([Constraint::Length(width)])
            .flex(Flex::Center)
            .areas(area);

        let block = Block::bordered()
            .title(Line::from(" Help ".bold()).centered())
            .border_set(border::THICK);
        frame.render_widget(Clear, area);
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

/// Cuts `name` down to `width` chars, marking the cut with an ellipsis.
fn get_visible_name(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        return name.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut reduced_name: String = name.chars().take(width - 1).collect();
    reduced_name.push('…');
    reduced_name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Message, TableConfig};
    use crate::loader::{user_columns, users_fixture};
    use ratatui::{Terminal, backend::TestBackend};

    fn render(model: &Model) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(80, 16)).unwrap();
        let mut ui = TableUI::new();
        terminal.draw(|f| ui.draw(model, f)).unwrap();
        terminal.backend().buffer().clone()
    }

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width).map(|x| buf[(x, y)].symbol()).collect()
    }

    fn model() -> Model {
        Model::init(&TableConfig::default(), users_fixture(), user_columns(), 80, 16)
    }

    #[test]
    fn visible_names_are_cut_with_ellipsis() {
        assert_eq!(get_visible_name("Name", 10), "Name");
        assert_eq!(get_visible_name("Prayagraj", 5), "Pray…");
        assert_eq!(get_visible_name("Prayagraj", 0), "");
    }

    #[test]
    fn renders_heading_header_rows_and_pager() {
        let model = model();
        let buf = render(&model);
        assert!(row_text(&buf, 0).starts_with("User Table"));
        assert!(row_text(&buf, 1).starts_with("Search: Search Table"));
        let header = row_text(&buf, 3);
        assert!(header.starts_with("ID ⇅"));
        assert!(header.contains("Name ⇅"));
        assert_eq!(header.chars().nth(14), HANDLE.chars().next());
        assert!(row_text(&buf, 4).contains("Filter City"));
        assert!(row_text(&buf, 5).starts_with("1 "));
        assert!(row_text(&buf, 5).contains("Ajay"));
        assert!(row_text(&buf, 9).contains("gill"));
        let pager = row_text(&buf, 10);
        assert!(pager.contains("[ Previous ]  Page 1 of 2  [ Next ]"));
    }

    #[test]
    fn renders_sort_indicator_and_help_popup() {
        let mut model = model();
        model.update(Some(Message::Sort)).unwrap();
        model.update(Some(Message::Sort)).unwrap();
        let buf = render(&model);
        assert!(row_text(&buf, 3).starts_with("ID ▼"));
        assert!(row_text(&buf, 5).starts_with("10"));

        model.update(Some(Message::Help)).unwrap();
        let buf = render(&model);
        let screen: String = (0..16).map(|y| row_text(&buf, y)).collect();
        assert!(screen.contains("Help"));
        assert!(screen.contains("Search & filter"));
    }
}
