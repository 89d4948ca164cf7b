// Cursor Exit Trigger - Pure State Machine
// Editor integrations that want to react when the user leaves the categories
// field feed cursor lines here; the tracker fires once per Inside -> Outside edge.

use super::frontmatter::FieldRegion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorState {
    #[default]
    Outside,
    Inside,
}

#[derive(Debug, Clone, Default)]
pub struct FieldCursorTracker {
    state: CursorState,
}

impl FieldCursorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Feed one cursor movement; `true` means the field was just left
    ///
    /// `region` is the field's current location, `None` when the document has no
    /// categories field at the moment.
    pub fn on_cursor(&mut self, line: usize, region: Option<&FieldRegion>) -> bool {
        let inside = region.is_some_and(|r| (r.start..=r.end).contains(&line));
        let next = if inside {
            CursorState::Inside
        } else {
            CursorState::Outside
        };
        let fired = self.state == CursorState::Inside && next == CursorState::Outside;
        self.state = next;
        fired
    }

    /// Forget the current state, e.g. when another document is opened
    pub fn reset(&mut self) {
        self.state = CursorState::Outside;
    }
}
