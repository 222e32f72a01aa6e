use tracing::trace;

/// Width units covered by one terminal cell.
pub const UNITS_PER_CELL: i32 = 10;

/// An in-progress drag on a column's resize handle.
///
/// While a session exists it receives every drag and release event, so the
/// move/up handling can never outlive the drag. It is released on mouse-up,
/// replaced by the next mouse-down and dropped together with its owner.
#[derive(Debug)]
pub struct DragSession {
    key: String,
    origin_x: u16,
    initial_width: u16,
}

impl DragSession {
    pub fn start(key: &str, origin_x: u16, initial_width: u16) -> Self {
        trace!("Drag on {key} started at x={origin_x}, width {initial_width}");
        Self {
            key: key.to_string(),
            origin_x,
            initial_width,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Width for the pointer now at `x`, relative to where the drag started.
    /// The caller decides whether the width is acceptable.
    pub fn width_at(&self, x: u16) -> i32 {
        let delta_x = i32::from(x) - i32::from(self.origin_x);
        i32::from(self.initial_width) + delta_x * UNITS_PER_CELL
    }
}

impl Drop for DragSession {
    fn drop(&mut self) {
        trace!("Drag on {} released", self.key);
    }
}

/// Number of terminal cells used to draw a column of `width` units.
pub fn cells_for(width: u16) -> u16 {
    (i32::from(width) / UNITS_PER_CELL).max(1) as u16
}
