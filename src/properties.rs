use crate::model::{FieldKind, FieldOwner, PropertyKey};
use crate::store::{FieldStore, UpdateOutcome};

/// Snapshot of the selected field's editable attributes, ready to populate a
/// form. Geometry is exposed in unscaled document coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct FormSnapshot {
    pub name: String,
    pub kind: FieldKind,
    pub value: String,
    pub is_required: bool,
    pub assigned_to: FieldOwner,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// What the properties panel shows: a form over the selected field, or an
/// explicit placeholder when nothing is selected.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertiesView {
    NoSelection,
    Selected(FormSnapshot),
}

impl PropertiesView {
    pub fn snapshot(&self) -> Option<&FormSnapshot> {
        match self {
            Self::Selected(snapshot) => Some(snapshot),
            Self::NoSelection => None,
        }
    }
}

/// Outcome of a form write. Writing with no selection is a no-op, not an
/// error: the panel shows the placeholder and discards input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied,
    NoSelection,
    InvalidValue,
}

pub fn view(store: &FieldStore) -> PropertiesView {
    match store.selected_field() {
        None => PropertiesView::NoSelection,
        Some(field) => PropertiesView::Selected(FormSnapshot {
            name: field.name.clone(),
            kind: field.kind,
            value: field.value.clone(),
            is_required: field.is_required,
            assigned_to: field.assigned_to,
            x: field.position.x,
            y: field.position.y,
            width: field.position.width,
            height: field.position.height,
        }),
    }
}

/// Write one property of the selected field through the store.
pub fn write(store: &mut FieldStore, key: PropertyKey, value: &str) -> WriteOutcome {
    let Some(id) = store.selected_id().cloned() else {
        return WriteOutcome::NoSelection;
    };
    match store.update(&id, key, value) {
        UpdateOutcome::Applied => WriteOutcome::Applied,
        // Selection always points at a live field, but a racing removal
        // between reads degrades to the same no-op as no selection.
        UpdateOutcome::NotFound => WriteOutcome::NoSelection,
        UpdateOutcome::InvalidValue => WriteOutcome::InvalidValue,
    }
}

/// Delete the selected field; clears the selection via the store.
pub fn delete_selected(store: &mut FieldStore) -> bool {
    let Some(id) = store.selected_id().cloned() else {
        return false;
    };
    store.remove(&id)
}
