use crate::model::{Field, FieldId, FieldKind, FieldOwner, PropertyKey};

/// Outcome of a keyed property update. Unknown ids are a silent no-op:
/// overlay elements can reference stale ids transiently during re-renders,
/// so `NotFound` is not surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    NotFound,
    InvalidValue,
}

/// Owns the ordered set of fields for one editing session plus the single
/// selection. Created when a session starts, discarded on teardown; nothing
/// survives except through the external document collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldStore {
    fields: Vec<Field>,
    selected: Option<FieldId>,
    user_context: FieldOwner,
}

impl FieldStore {
    pub fn new(user_context: FieldOwner) -> Self {
        Self {
            fields: Vec::new(),
            selected: None,
            user_context,
        }
    }

    pub fn user_context(&self) -> FieldOwner {
        self.user_context
    }

    /// Create a field with default geometry on `page`, assigned to the
    /// current user context. The new field becomes the selection.
    pub fn add(&mut self, kind: FieldKind, page: u32) -> &Field {
        let mut id = FieldId::generate();
        while self.get(&id).is_some() {
            id = FieldId::generate();
        }
        let field = Field::new(id.clone(), kind, self.user_context, page);
        self.fields.push(field);
        self.selected = Some(id);
        let index = self.fields.len() - 1;
        &self.fields[index]
    }

    pub fn update(&mut self, id: &FieldId, key: PropertyKey, value: &str) -> UpdateOutcome {
        let Some(field) = self.fields.iter_mut().find(|f| f.id() == id) else {
            tracing::debug!(field_id = %id, property = key.as_str(), "update for unknown field ignored");
            return UpdateOutcome::NotFound;
        };
        match field.apply(key, value) {
            Ok(()) => UpdateOutcome::Applied,
            Err(err) => {
                tracing::warn!(field_id = %id, %err, "rejected field update");
                UpdateOutcome::InvalidValue
            }
        }
    }

    /// Move a field, clamped to the document origin.
    pub fn move_field(&mut self, id: &FieldId, x: f32, y: f32) -> bool {
        let Some(field) = self.fields.iter_mut().find(|f| f.id() == id) else {
            return false;
        };
        field.position.x = x;
        field.position.y = y;
        field.position.clamp_origin();
        field.touch();
        true
    }

    /// Resize a field, clamped to the minimum hit-target size.
    pub fn resize_field(&mut self, id: &FieldId, width: f32, height: f32) -> bool {
        let Some(field) = self.fields.iter_mut().find(|f| f.id() == id) else {
            return false;
        };
        field.position.width = width;
        field.position.height = height;
        field.position.clamp_size();
        field.touch();
        true
    }

    /// Delete a field. Removing the selected field clears the selection.
    pub fn remove(&mut self, id: &FieldId) -> bool {
        let before = self.fields.len();
        self.fields.retain(|f| f.id() != id);
        let removed = self.fields.len() != before;
        if removed && self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        removed
    }

    /// Bulk-load fields from an external source, clearing prior state.
    pub fn replace_all(&mut self, fields: Vec<Field>) {
        self.fields = fields;
        self.selected = None;
    }

    /// Insertion order preserved for stable list rendering.
    pub fn all(&self) -> &[Field] {
        &self.fields
    }

    pub fn get(&self, id: &FieldId) -> Option<&Field> {
        self.fields.iter().find(|f| f.id() == id)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Select a field by id; selecting an unknown id leaves the selection
    /// untouched and reports false.
    pub fn select(&mut self, id: &FieldId) -> bool {
        if self.get(id).is_some() {
            self.selected = Some(id.clone());
            true
        } else {
            false
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected_id(&self) -> Option<&FieldId> {
        self.selected.as_ref()
    }

    pub fn selected_field(&self) -> Option<&Field> {
        self.selected.as_ref().and_then(|id| self.get(id))
    }
}
