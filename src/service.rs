use crate::geometry::{OverlayOrigin, PageCursor, Zoom};
use crate::input::{
    shortcut_command, EditorCommand, Gesture, InteractionController, KeyEvent, PointerTarget,
};
use crate::messages::{FieldUpdate, PresenceAction, PresenceEvent, SessionId, TransportError};
use crate::model::{Field, FieldId, FieldKind, FieldOwner, PropertyKey};
use crate::notify::NotificationFeed;
use crate::properties::{self, PropertiesView, WriteOutcome};
use crate::relay::{CollaborationRelay, RemoteOutcome};
use crate::render::{build_scene, FieldSprite, SceneParams};
use crate::store::{FieldStore, UpdateOutcome};
use serde::{Deserialize, Serialize};

pub const PDF_MIME: &str = "application/pdf";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rendered-page metadata the viewer needs to size the overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagePreview {
    pub document_id: DocumentId,
    pub page_count: u32,
    pub width: f32,
    pub height: f32,
}

pub trait DocumentSource {
    fn fetch_fields(&self, document_id: &DocumentId) -> Result<Vec<Field>, TransportError>;
    fn fetch_preview(&self, document_id: &DocumentId) -> Result<PagePreview, TransportError>;
}

pub trait PersistenceSink {
    fn save_fields(&self, document_id: &DocumentId, fields: &[Field])
        -> Result<(), TransportError>;
}

pub trait ExportSink {
    fn download(&self, document_id: &DocumentId) -> Result<Vec<u8>, TransportError>;
}

/// Session-level failure taxonomy. None of these are fatal; each degrades to
/// a notification and leaves the prior state intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    NotFound,
    Transport(TransportError),
    Validation(String),
}

impl std::fmt::Display for EditorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => f.write_str("referenced field does not exist"),
            Self::Transport(err) => write!(f, "{err}"),
            Self::Validation(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for EditorError {}

impl From<TransportError> for EditorError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err)
    }
}

/// Fencing token for an in-flight field load. Completions carrying a ticket
/// older than the newest `begin_load` are ignored, so a slow stale response
/// cannot overwrite newer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(usize),
    Stale,
    Failed,
    NoDocument,
}

/// Explicit editing context: one per open document view. Every interaction
/// handler receives this object instead of reaching for a shared global, and
/// field-targeting operations take the field id as a parameter.
pub struct EditorSession {
    document_id: Option<DocumentId>,
    pub store: FieldStore,
    pub zoom: Zoom,
    pub page: PageCursor,
    pub origin: OverlayOrigin,
    pub relay: CollaborationRelay,
    pub notifications: NotificationFeed,
    /// Drag/resize enabled; fill-only views switch this off.
    pub interactive: bool,
    controller: InteractionController,
    load_generation: u64,
    preview: Option<PagePreview>,
}

impl EditorSession {
    pub fn new(document_id: Option<DocumentId>, user_context: FieldOwner) -> Self {
        Self::with_relay(
            document_id,
            user_context,
            CollaborationRelay::new(SessionId::generate()),
        )
    }

    pub fn with_relay(
        document_id: Option<DocumentId>,
        user_context: FieldOwner,
        relay: CollaborationRelay,
    ) -> Self {
        Self {
            document_id,
            store: FieldStore::new(user_context),
            zoom: Zoom::default(),
            page: PageCursor::default(),
            origin: OverlayOrigin::default(),
            relay,
            notifications: NotificationFeed::new(),
            interactive: true,
            controller: InteractionController::new(),
            load_generation: 0,
            preview: None,
        }
    }

    pub fn document_id(&self) -> Option<&DocumentId> {
        self.document_id.as_ref()
    }

    pub fn preview(&self) -> Option<&PagePreview> {
        self.preview.as_ref()
    }

    pub fn gesture(&self) -> &Gesture {
        self.controller.gesture()
    }

    // ---- loading -------------------------------------------------------

    pub fn begin_load(&mut self) -> LoadTicket {
        self.load_generation += 1;
        LoadTicket {
            generation: self.load_generation,
        }
    }

    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Field>, TransportError>,
    ) -> LoadOutcome {
        if ticket.generation != self.load_generation {
            tracing::debug!(
                stale = ticket.generation,
                current = self.load_generation,
                "stale field load ignored"
            );
            return LoadOutcome::Stale;
        }
        match result {
            Ok(fields) => {
                let count = fields.len();
                self.store.replace_all(fields);
                tracing::info!(count, "fields loaded");
                LoadOutcome::Loaded(count)
            }
            Err(err) => {
                tracing::warn!(%err, "field load failed");
                self.notifications.push_error("Failed to load document");
                LoadOutcome::Failed
            }
        }
    }

    pub fn load_from(&mut self, source: &dyn DocumentSource) -> LoadOutcome {
        let Some(document_id) = self.document_id.clone() else {
            return LoadOutcome::NoDocument;
        };
        let ticket = self.begin_load();
        let result = source.fetch_fields(&document_id);
        self.complete_load(ticket, result)
    }

    pub fn load_preview(&mut self, source: &dyn DocumentSource) {
        let Some(document_id) = self.document_id.clone() else {
            return;
        };
        match source.fetch_preview(&document_id) {
            Ok(preview) => {
                self.page = PageCursor::new(preview.page_count);
                self.preview = Some(preview);
            }
            Err(err) => {
                tracing::warn!(%err, "preview load failed");
                self.notifications.push_error("Failed to load PDF");
            }
        }
    }

    // ---- persistence ---------------------------------------------------

    pub fn save_to(&mut self, sink: &dyn PersistenceSink) -> Result<(), EditorError> {
        let Some(document_id) = self.document_id.clone() else {
            self.notifications.push_error("No document ID provided");
            return Err(EditorError::Validation("no document id".to_string()));
        };
        match sink.save_fields(&document_id, self.store.all()) {
            Ok(()) => {
                self.notifications.push_success("Fields saved successfully");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(%err, document_id = %document_id, "save failed");
                self.notifications.push_error("Failed to save fields");
                Err(err.into())
            }
        }
    }

    /// Reject non-PDF uploads before anything touches the network.
    pub fn validate_upload(&mut self, mime: &str) -> Result<(), EditorError> {
        if mime != PDF_MIME {
            self.notifications.push_error("Please select a PDF file");
            return Err(EditorError::Validation(format!(
                "unsupported upload type {mime}"
            )));
        }
        Ok(())
    }

    pub fn download_from(&mut self, export: &dyn ExportSink) -> Result<Vec<u8>, EditorError> {
        let Some(document_id) = self.document_id.clone() else {
            self.notifications.push_error("No document ID provided");
            return Err(EditorError::Validation("no document id".to_string()));
        };
        match export.download(&document_id) {
            Ok(bytes) => Ok(bytes),
            Err(err) => {
                tracing::warn!(%err, document_id = %document_id, "download failed");
                self.notifications.push_error("Download failed");
                Err(err.into())
            }
        }
    }

    // ---- local editing -------------------------------------------------

    /// Toolbar "add field": created on the current page and selected.
    /// Creation reaches peers through save/reload, not the update stream.
    pub fn add_field(&mut self, kind: FieldKind) -> FieldId {
        let page = self.page.current();
        self.store.add(kind, page).id().clone()
    }

    /// Properties-form write for the selected field; applied updates are
    /// mirrored to peers.
    pub fn set_property(&mut self, key: PropertyKey, value: &str) -> WriteOutcome {
        let selected = self.store.selected_id().cloned();
        let outcome = properties::write(&mut self.store, key, value);
        if outcome == WriteOutcome::Applied {
            if let Some(id) = selected {
                self.relay.emit_update(&id, key, value.to_string());
                self.notifications
                    .push_success(format!("Updated {}", key.as_str()));
            }
        }
        outcome
    }

    /// Direct value edit of any field widget (not just the selection), e.g.
    /// typing into an overlay input.
    pub fn set_field_value(&mut self, id: &FieldId, value: &str) -> WriteOutcome {
        match self.store.update(id, PropertyKey::Value, value) {
            UpdateOutcome::Applied => {
                self.relay
                    .emit_update(id, PropertyKey::Value, value.to_string());
                WriteOutcome::Applied
            }
            UpdateOutcome::NotFound => WriteOutcome::NoSelection,
            UpdateOutcome::InvalidValue => WriteOutcome::InvalidValue,
        }
    }

    pub fn delete_selected(&mut self) -> bool {
        properties::delete_selected(&mut self.store)
    }

    pub fn properties_view(&self) -> PropertiesView {
        properties::view(&self.store)
    }

    pub fn focus_field(&mut self, id: &FieldId) {
        self.relay.emit_presence(id, PresenceAction::Focus);
    }

    pub fn blur_field(&mut self, id: &FieldId) {
        self.relay.emit_presence(id, PresenceAction::Blur);
    }

    // ---- pointer / keyboard --------------------------------------------

    pub fn pointer_down(&mut self, target: PointerTarget, pointer: (f32, f32)) {
        if !self.interactive {
            return;
        }
        self.controller
            .pointer_down(&mut self.store, target, pointer, self.zoom, self.origin);
    }

    pub fn pointer_move(&mut self, pointer: (f32, f32)) -> bool {
        self.controller
            .pointer_move(&mut self.store, pointer, self.zoom, self.origin)
    }

    /// Gesture end: the committed geometry is propagated once, not per-frame.
    pub fn pointer_up(&mut self) -> Option<FieldId> {
        let committed = self.controller.pointer_up()?;
        if let Some(field) = self.store.get(&committed) {
            let position = field.position;
            for (key, value) in [
                (PropertyKey::X, position.x.to_string()),
                (PropertyKey::Y, position.y.to_string()),
                (PropertyKey::Width, position.width.to_string()),
                (PropertyKey::Height, position.height.to_string()),
            ] {
                self.relay.emit_update(&committed, key, value);
            }
        }
        Some(committed)
    }

    /// Keyboard dispatch. Zoom commands are applied in place; `Save` is
    /// returned so the caller can route it to its persistence sink.
    pub fn handle_key(&mut self, event: KeyEvent) -> Option<EditorCommand> {
        let command = shortcut_command(event)?;
        match command {
            EditorCommand::ZoomIn => self.zoom.zoom_in(),
            EditorCommand::ZoomOut => self.zoom.zoom_out(),
            EditorCommand::Save => {}
        }
        Some(command)
    }

    // ---- collaboration -------------------------------------------------

    pub fn apply_remote_update(&mut self, update: &FieldUpdate) -> RemoteOutcome {
        let active = self.controller.active_field().cloned();
        self.relay
            .apply_remote_update(&mut self.store, update, active.as_ref())
    }

    pub fn apply_remote_presence(&mut self, event: &PresenceEvent) -> bool {
        self.relay.apply_remote_presence(event)
    }

    /// Transport came (back) up. After a drop the buffered event stream is
    /// untrustworthy, so the full field set is reloaded from the source.
    pub fn handle_connect(&mut self, source: &dyn DocumentSource) -> Option<LoadOutcome> {
        if self.relay.handle_connect() {
            Some(self.load_from(source))
        } else {
            None
        }
    }

    pub fn handle_disconnect(&mut self) {
        self.relay.handle_disconnect();
    }

    // ---- rendering -----------------------------------------------------

    pub fn scene(&self) -> Vec<FieldSprite> {
        build_scene(
            &self.store,
            Some(&self.relay),
            SceneParams {
                zoom: self.zoom,
                origin: self.origin,
                page: self.page.current(),
                interactive: self.interactive,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct StaticSource {
        fields: Vec<Field>,
        preview: Option<PagePreview>,
    }

    impl StaticSource {
        fn with_fields(fields: Vec<Field>) -> Self {
            Self {
                fields,
                preview: None,
            }
        }
    }

    impl DocumentSource for StaticSource {
        fn fetch_fields(&self, _document_id: &DocumentId) -> Result<Vec<Field>, TransportError> {
            Ok(self.fields.clone())
        }

        fn fetch_preview(&self, _document_id: &DocumentId) -> Result<PagePreview, TransportError> {
            self.preview
                .clone()
                .ok_or_else(|| TransportError::Failed("no preview".to_string()))
        }
    }

    struct RecordingSink {
        saved: RefCell<Vec<(DocumentId, Vec<Field>)>>,
        fail: bool,
    }

    impl RecordingSink {
        fn new(fail: bool) -> Self {
            Self {
                saved: RefCell::new(Vec::new()),
                fail,
            }
        }
    }

    impl PersistenceSink for RecordingSink {
        fn save_fields(
            &self,
            document_id: &DocumentId,
            fields: &[Field],
        ) -> Result<(), TransportError> {
            if self.fail {
                return Err(TransportError::Failed("boom".to_string()));
            }
            self.saved
                .borrow_mut()
                .push((document_id.clone(), fields.to_vec()));
            Ok(())
        }
    }

    fn session() -> EditorSession {
        EditorSession::new(Some(DocumentId::new("doc-1")), FieldOwner::User1)
    }

    fn sample_field(id: &str) -> Field {
        Field::new(FieldId::new(id), FieldKind::Text, FieldOwner::User2, 0)
    }

    #[test]
    fn load_replaces_fields_in_fetched_order() {
        let mut session = session();
        let source =
            StaticSource::with_fields(vec![sample_field("a"), sample_field("b")]);

        assert_eq!(session.load_from(&source), LoadOutcome::Loaded(2));
        let ids: Vec<_> = session.store.all().iter().map(|f| f.id().as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn stale_load_completion_is_ignored() {
        let mut session = session();

        let stale_ticket = session.begin_load();
        let fresh_ticket = session.begin_load();

        assert_eq!(
            session.complete_load(fresh_ticket, Ok(vec![sample_field("fresh")])),
            LoadOutcome::Loaded(1)
        );
        // The older request resolves afterwards; it must not clobber state.
        assert_eq!(
            session.complete_load(stale_ticket, Ok(vec![sample_field("stale")])),
            LoadOutcome::Stale
        );
        assert_eq!(session.store.all()[0].id().as_str(), "fresh");
    }

    #[test]
    fn failed_load_keeps_prior_fields_and_notifies() {
        let mut session = session();
        session.store.replace_all(vec![sample_field("kept")]);

        let ticket = session.begin_load();
        let outcome =
            session.complete_load(ticket, Err(TransportError::Failed("offline".to_string())));

        assert_eq!(outcome, LoadOutcome::Failed);
        assert_eq!(session.store.len(), 1);
        let latest = session.notifications.latest().expect("notification");
        assert_eq!(latest.message, "Failed to load document");
    }

    #[test]
    fn save_without_document_id_is_a_validation_failure() {
        let mut session = EditorSession::new(None, FieldOwner::User1);
        let sink = RecordingSink::new(false);

        let err = session.save_to(&sink).expect_err("must fail");
        assert!(matches!(err, EditorError::Validation(_)));
        assert!(sink.saved.borrow().is_empty());
    }

    #[test]
    fn save_failure_notifies_and_keeps_state() {
        let mut session = session();
        session.add_field(FieldKind::Text);
        let sink = RecordingSink::new(true);

        let err = session.save_to(&sink).expect_err("must fail");
        assert!(matches!(err, EditorError::Transport(_)));
        assert_eq!(session.store.len(), 1);
        assert_eq!(
            session.notifications.latest().expect("notification").message,
            "Failed to save fields"
        );
    }

    #[test]
    fn save_success_passes_all_fields_to_the_sink() {
        let mut session = session();
        session.add_field(FieldKind::Text);
        session.add_field(FieldKind::Checkbox);
        let sink = RecordingSink::new(false);

        session.save_to(&sink).expect("save");
        let saved = sink.saved.borrow();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0, DocumentId::new("doc-1"));
        assert_eq!(saved[0].1.len(), 2);
    }

    #[test]
    fn non_pdf_upload_is_rejected_before_transport() {
        let mut session = session();
        let err = session.validate_upload("image/png").expect_err("must fail");
        assert!(matches!(err, EditorError::Validation(_)));
        assert_eq!(
            session.notifications.latest().expect("notification").message,
            "Please select a PDF file"
        );

        assert!(session.validate_upload(PDF_MIME).is_ok());
    }

    #[test]
    fn add_field_lands_on_the_current_page() {
        let mut session = session();
        session.page = PageCursor::new(3);
        session.page.next();

        let id = session.add_field(FieldKind::Text);
        assert_eq!(session.store.get(&id).expect("field").position.page, 1);
        assert_eq!(session.store.selected_id(), Some(&id));
    }

    #[test]
    fn set_property_requires_selection() {
        let mut session = session();
        assert_eq!(
            session.set_property(PropertyKey::Name, "x"),
            WriteOutcome::NoSelection
        );

        session.add_field(FieldKind::Text);
        assert_eq!(
            session.set_property(PropertyKey::Name, "Tenant name"),
            WriteOutcome::Applied
        );
        assert_eq!(session.store.selected_field().expect("field").name, "Tenant name");
    }

    #[test]
    fn keyboard_zoom_commands_apply_in_place() {
        let mut session = session();
        let ctrl = crate::input::KeyModifiers { ctrl: true };
        session.handle_key(KeyEvent {
            key: crate::input::KeyCode::Plus,
            modifiers: ctrl,
        });
        assert!(session.zoom.level() > 1.0);

        let command = session.handle_key(KeyEvent {
            key: crate::input::KeyCode::S,
            modifiers: ctrl,
        });
        assert_eq!(command, Some(EditorCommand::Save));
    }

    #[test]
    fn preview_load_sets_page_count() {
        let mut session = session();
        let mut source = StaticSource::with_fields(Vec::new());
        source.preview = Some(PagePreview {
            document_id: DocumentId::new("doc-1"),
            page_count: 4,
            width: 612.0,
            height: 792.0,
        });

        session.load_preview(&source);
        assert_eq!(session.page.total(), 4);
        assert!(session.preview().is_some());
    }

    #[test]
    fn preview_failure_degrades_to_notification() {
        let mut session = session();
        let source = StaticSource::with_fields(Vec::new());
        session.load_preview(&source);
        assert_eq!(
            session.notifications.latest().expect("notification").message,
            "Failed to load PDF"
        );
    }

    #[test]
    fn reconnect_triggers_full_reload() {
        let mut session = session();
        let source = StaticSource::with_fields(vec![sample_field("a")]);

        // First connect: no resync needed.
        assert_eq!(session.handle_connect(&source), None);
        session.handle_disconnect();
        assert_eq!(
            session.handle_connect(&source),
            Some(LoadOutcome::Loaded(1))
        );
    }

    #[test]
    fn non_interactive_session_ignores_pointer_down() {
        let mut session = session();
        let id = session.add_field(FieldKind::Text);
        session.interactive = false;

        session.pointer_down(PointerTarget::FieldBody(id), (110.0, 110.0));
        assert!(session.gesture().is_idle());
    }
}
