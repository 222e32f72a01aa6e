use std::time::Duration;
use tracing::trace;

use ratatui::crossterm::event::{
    self, Event, KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::domain::{Message, TableConfig, TableError};
use crate::model::Model;

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &TableConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, TableError> {
        if !event::poll(Duration::from_millis(self.event_poll_time))? {
            return Ok(None);
        }
        Ok(self.map_event(event::read()?, model))
    }

    fn map_event(&self, event: Event, model: &Model) -> Option<Message> {
        match event {
            Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                if model.raw_keyevents() {
                    Some(Message::RawKey(key))
                } else {
                    self.handle_key(key)
                }
            }
            Event::Mouse(mouse) => self.handle_mouse(mouse, model.is_dragging()),
            Event::Resize(width, height) => Some(Message::Resize(width, height)),
            _ => None,
        }
    }

    fn handle_key(&self, key: event::KeyEvent) -> Option<Message> {
        let message = match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Message::Quit),
            (KeyCode::Char('q'), _) => Some(Message::Quit),
            (KeyCode::Char('?'), _) => Some(Message::Help),
            (KeyCode::Esc, _) => Some(Message::Exit),
            (KeyCode::Char('/'), _) => Some(Message::Search),
            (KeyCode::Char('f'), _) => Some(Message::Filter),
            (KeyCode::Char('c'), _) => Some(Message::ClearFilters),
            (KeyCode::Char('s'), _) => Some(Message::Sort),
            (KeyCode::Right, KeyModifiers::NONE) | (KeyCode::Char('l'), _) => {
                Some(Message::SelectNextColumn)
            }
            (KeyCode::Left, KeyModifiers::NONE) | (KeyCode::Char('h'), _) => {
                Some(Message::SelectPreviousColumn)
            }
            (KeyCode::Right, KeyModifiers::SHIFT)
            | (KeyCode::Char('L'), _)
            | (KeyCode::Char('>'), _) => Some(Message::MoveColumnRight),
            (KeyCode::Left, KeyModifiers::SHIFT)
            | (KeyCode::Char('H'), _)
            | (KeyCode::Char('<'), _) => Some(Message::MoveColumnLeft),
            (KeyCode::Char('+'), _) | (KeyCode::Char('='), _) => Some(Message::WidenColumn),
            (KeyCode::Char('-'), _) => Some(Message::NarrowColumn),
            (KeyCode::Char('n'), _) | (KeyCode::PageDown, _) => Some(Message::NextPage),
            (KeyCode::Char('p'), _) | (KeyCode::PageUp, _) => Some(Message::PreviousPage),
            (KeyCode::Home, _) | (KeyCode::Char('g'), _) => Some(Message::FirstPage),
            (KeyCode::End, _) | (KeyCode::Char('G'), _) => Some(Message::LastPage),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }

    fn handle_mouse(&self, mouse: MouseEvent, dragging: bool) -> Option<Message> {
        let (x, y) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => Some(Message::MouseDown(x, y)),
            MouseEventKind::Drag(MouseButton::Left) => Some(Message::MouseDrag(x, y)),
            // Some terminals report motion without the button while it is held.
            MouseEventKind::Moved if dragging => Some(Message::MouseDrag(x, y)),
            MouseEventKind::Up(_) => Some(Message::MouseUp(x, y)),
            MouseEventKind::ScrollDown => Some(Message::NextPage),
            MouseEventKind::ScrollUp => Some(Message::PreviousPage),
            _ => None,
        }
    }
}
