use crate::geometry::{screen_rect, OverlayOrigin, Zoom};
use crate::model::FieldId;
use crate::store::FieldStore;

/// What the pointer landed on when it went down on the overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerTarget {
    FieldBody(FieldId),
    ResizeHandle(FieldId),
    Empty,
}

/// Pointer-driven gesture state. Dragging keeps the pointer offset relative
/// to the field's screen top-left so the field does not jump under the
/// cursor.
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    Idle,
    Dragging { field: FieldId, offset: (f32, f32) },
    Resizing { field: FieldId },
}

impl Gesture {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl Default for Gesture {
    fn default() -> Self {
        Self::Idle
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionController {
    gesture: Gesture,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    /// Field currently being dragged or resized, if any. Remote updates to
    /// this field are dropped until the gesture completes.
    pub fn active_field(&self) -> Option<&FieldId> {
        match self.gesture() {
            Gesture::Dragging { field, .. } | Gesture::Resizing { field } => Some(field),
            Gesture::Idle => None,
        }
    }

    /// pointerdown: body starts a drag, handle starts a resize, empty space
    /// clears the selection. Both gestures select the target field.
    pub fn pointer_down(
        &mut self,
        store: &mut FieldStore,
        target: PointerTarget,
        pointer: (f32, f32),
        zoom: Zoom,
        origin: OverlayOrigin,
    ) {
        match target {
            PointerTarget::FieldBody(id) => {
                let Some(field) = store.get(&id) else {
                    return;
                };
                let rect = screen_rect(&field.position, zoom, origin);
                let offset = (pointer.0 - rect.left, pointer.1 - rect.top);
                store.select(&id);
                self.gesture = Gesture::Dragging { field: id, offset };
            }
            PointerTarget::ResizeHandle(id) => {
                if store.select(&id) {
                    self.gesture = Gesture::Resizing { field: id };
                }
            }
            PointerTarget::Empty => {
                store.clear_selection();
            }
        }
    }

    /// pointermove: recompute unscaled geometry from the screen-space pointer.
    /// Returns true when a field's geometry changed, which obliges the caller
    /// to re-render every overlay sprite and refresh the properties form.
    pub fn pointer_move(
        &mut self,
        store: &mut FieldStore,
        pointer: (f32, f32),
        zoom: Zoom,
        origin: OverlayOrigin,
    ) -> bool {
        let scale = zoom.level();
        match self.gesture.clone() {
            Gesture::Idle => false,
            Gesture::Dragging { field, offset } => {
                let x = (pointer.0 - origin.x - offset.0) / scale;
                let y = (pointer.1 - origin.y - offset.1) / scale;
                let moved = store.move_field(&field, x, y);
                if !moved {
                    // Field vanished mid-gesture (e.g. removed remotely).
                    self.gesture = Gesture::Idle;
                }
                moved
            }
            Gesture::Resizing { field } => {
                let Some(position) = store.get(&field).map(|f| f.position) else {
                    self.gesture = Gesture::Idle;
                    return false;
                };
                let width = (pointer.0 - origin.x) / scale - position.x;
                let height = (pointer.1 - origin.y) / scale - position.y;
                store.resize_field(&field, width, height)
            }
        }
    }

    /// pointerup: back to idle. Returns the field whose geometry was being
    /// rewritten so the caller can propagate the final position once, rather
    /// than per-frame.
    pub fn pointer_up(&mut self) -> Option<FieldId> {
        match std::mem::take(&mut self.gesture) {
            Gesture::Dragging { field, .. } | Gesture::Resizing { field } => Some(field),
            Gesture::Idle => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyModifiers {
    pub ctrl: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    S,
    Plus,
    Equals,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: KeyCode,
    pub modifiers: KeyModifiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorCommand {
    Save,
    ZoomIn,
    ZoomOut,
}

/// Keyboard shortcuts: Ctrl+S saves, Ctrl+'+'/'=' zooms in, Ctrl+'-' zooms
/// out. Everything else falls through to the focused widget.
pub fn shortcut_command(event: KeyEvent) -> Option<EditorCommand> {
    if !event.modifiers.ctrl {
        return None;
    }
    match event.key {
        KeyCode::S => Some(EditorCommand::Save),
        KeyCode::Plus | KeyCode::Equals => Some(EditorCommand::ZoomIn),
        KeyCode::Minus => Some(EditorCommand::ZoomOut),
    }
}
