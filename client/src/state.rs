use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use inkpad_shared::InputMode;

pub const BACKGROUND_COLOR: &str = "#ffffff";
pub const DEFAULT_COLOR: &str = "#000000";
pub const PEN_WIDTH: f64 = 2.0;
pub const ERASER_WIDTH: f64 = 20.0;
/// Fixed audio recording window for the webcam capture flow.
pub const RECORDING_MS: i32 = 3000;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tool {
    Pen,
    Eraser,
}

pub enum DragState {
    Idle,
    Drawing { last_x: f64, last_y: f64 },
}

pub struct PadState {
    pub canvas: HtmlCanvasElement,
    pub ctx: CanvasRenderingContext2d,
    pub tool: Tool,
    pub color: String,
    pub mode: InputMode,
    pub drag: DragState,
    pub dirty: bool,
    /// Bumped on every raster change; lets a saved snapshot id be recognized
    /// as stale once the drawing on screen no longer matches it.
    pub epoch: u64,
}

/// Id of the last saved snapshot, tagged with the surface epoch it captured.
/// The id is handed out at most once, and only while the surface is still at
/// that epoch.
#[derive(Default)]
pub struct PendingAnalysis {
    saved: Option<(String, u64)>,
}

impl PendingAnalysis {
    pub fn record(&mut self, id: String, epoch: u64) {
        self.saved = Some((id, epoch));
    }

    pub fn take_if_current(&mut self, epoch: u64) -> Option<String> {
        match self.saved.take() {
            Some((id, saved)) if saved == epoch => Some(id),
            _ => None,
        }
    }
}

/// Color and line width for the next segment. The eraser overdraws in the
/// background color at a fixed wide width; the selected swatch never leaks
/// into eraser strokes. A non-white background would make the overdraw
/// visible, since the raster is painted over rather than erased.
pub fn stroke_paint(tool: Tool, color: &str) -> (String, f64) {
    match tool {
        Tool::Pen => (color.to_string(), PEN_WIDTH),
        Tool::Eraser => (BACKGROUND_COLOR.to_string(), ERASER_WIDTH),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pen_uses_selected_color() {
        let (color, width) = stroke_paint(Tool::Pen, "#ff0000");
        assert_eq!(color, "#ff0000");
        assert_eq!(width, PEN_WIDTH);
    }

    #[test]
    fn eraser_ignores_selected_color() {
        let (color, width) = stroke_paint(Tool::Eraser, "#ff0000");
        assert_eq!(color, BACKGROUND_COLOR);
        assert_eq!(width, ERASER_WIDTH);
    }

    #[test]
    fn saved_id_is_spent_once() {
        let mut pending = PendingAnalysis::default();
        pending.record("abc".to_string(), 3);
        assert_eq!(pending.take_if_current(3).as_deref(), Some("abc"));
        assert_eq!(pending.take_if_current(3), None);
    }

    #[test]
    fn saved_id_goes_stale_when_the_surface_changes() {
        let mut pending = PendingAnalysis::default();
        pending.record("abc".to_string(), 3);
        assert_eq!(pending.take_if_current(4), None);

        pending.record("def".to_string(), 5);
        assert_eq!(pending.take_if_current(5).as_deref(), Some("def"));
    }
}
