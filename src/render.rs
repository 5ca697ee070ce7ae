use crate::geometry::{screen_rect, OverlayOrigin, ScreenRect, Zoom};
use crate::model::{Field, FieldId, FieldKind, FieldOwner};
use crate::relay::CollaborationRelay;
use crate::store::FieldStore;

pub const SIGNATURE_PROMPT: &str = "Click to sign";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

pub const USER1_COLOR: Rgba = Rgba::rgba(0, 123, 255, 255);
pub const USER2_COLOR: Rgba = Rgba::rgba(40, 167, 69, 255);
pub const ADMIN_COLOR: Rgba = Rgba::rgba(108, 117, 125, 255);

/// Assignment drives the border/label color so each participant can see at a
/// glance which fields are theirs.
pub fn owner_color(owner: FieldOwner) -> Rgba {
    match owner {
        FieldOwner::User1 => USER1_COLOR,
        FieldOwner::User2 => USER2_COLOR,
        FieldOwner::Admin => ADMIN_COLOR,
    }
}

/// Widget a sprite should render as; derived from the field kind and value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetKind {
    TextInput,
    DateInput,
    MultilineInput,
    Checkbox { checked: bool },
    SignaturePlaceholder { prompt: String },
}

pub fn widget_for(field: &Field) -> WidgetKind {
    match field.kind {
        FieldKind::Text | FieldKind::Email | FieldKind::Tel => WidgetKind::TextInput,
        FieldKind::Date => WidgetKind::DateInput,
        FieldKind::Textarea => WidgetKind::MultilineInput,
        FieldKind::Checkbox => WidgetKind::Checkbox {
            checked: field.value == "true",
        },
        FieldKind::Signature => WidgetKind::SignaturePlaceholder {
            prompt: if field.value.is_empty() {
                SIGNATURE_PROMPT.to_string()
            } else {
                field.value.clone()
            },
        },
    }
}

/// Everything the presentation layer needs to draw one field, already
/// transformed into screen coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSprite {
    pub field_id: FieldId,
    pub rect: ScreenRect,
    pub label: String,
    pub color: Rgba,
    pub widget: WidgetKind,
    pub selected: bool,
    pub resize_handle: bool,
    pub peer_editing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneParams {
    pub zoom: Zoom,
    pub origin: OverlayOrigin,
    pub page: u32,
    /// Whether drag/resize is enabled for this view (fill-only views hide
    /// the resize handles).
    pub interactive: bool,
}

/// Pure scene builder: state in, sprites out. The presentation layer
/// observes store mutations and redraws from this list instead of patching
/// markup in place.
pub fn build_scene(
    store: &FieldStore,
    relay: Option<&CollaborationRelay>,
    params: SceneParams,
) -> Vec<FieldSprite> {
    store
        .all()
        .iter()
        .filter(|field| field.position.page == params.page)
        .map(|field| FieldSprite {
            field_id: field.id().clone(),
            rect: screen_rect(&field.position, params.zoom, params.origin),
            label: field.name.clone(),
            color: owner_color(field.assigned_to),
            widget: widget_for(field),
            selected: store.selected_id() == Some(field.id()),
            resize_handle: params.interactive,
            peer_editing: relay
                .map(|r| r.peer_editing(field.id()).is_some())
                .unwrap_or(false),
        })
        .collect()
}
