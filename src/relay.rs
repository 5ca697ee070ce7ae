use crate::messages::{
    ConnectionState, FieldUpdate, PresenceAction, PresenceEvent, SessionId, TransportError,
};
use crate::model::{FieldId, PropertyKey};
use crate::store::{FieldStore, UpdateOutcome};
use std::collections::HashMap;
use std::sync::mpsc::Sender;

/// Outbound side of the realtime channel. The relay only needs fire-and-forget
/// publishing; subscription plumbing lives with whoever owns the transport.
pub trait RealtimeTransport {
    fn publish_update(&self, update: &FieldUpdate) -> Result<(), TransportError>;
    fn publish_presence(&self, event: &PresenceEvent) -> Result<(), TransportError>;
}

/// What happened to an inbound remote update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOutcome {
    Applied,
    /// Carried our own session id; applying it again would risk feedback
    /// loops, so it is discarded.
    OwnEcho,
    /// Targets the field of an in-flight local drag/resize. Local
    /// interaction wins until pointerup.
    LocalGestureWins,
    /// Referenced a field this client does not have; silent no-op.
    UnknownField,
    InvalidValue,
}

/// Mirrors local field mutations to peers and applies inbound remote
/// mutations to the store, suppressing echoes of this client's own updates.
pub struct CollaborationRelay {
    session: SessionId,
    connection: ConnectionState,
    was_connected: bool,
    transport: Option<Box<dyn RealtimeTransport>>,
    peer_focus: HashMap<FieldId, SessionId>,
}

impl CollaborationRelay {
    pub fn new(session: SessionId) -> Self {
        Self {
            session,
            connection: ConnectionState::Disconnected,
            was_connected: false,
            transport: None,
            peer_focus: HashMap::new(),
        }
    }

    pub fn with_transport(session: SessionId, transport: Box<dyn RealtimeTransport>) -> Self {
        let mut relay = Self::new(session);
        relay.transport = Some(transport);
        relay
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// Mark the channel connected. Returns true when this is a reconnect
    /// after a drop, in which case the caller must reload the full field set
    /// from the document source rather than trust buffered events.
    pub fn handle_connect(&mut self) -> bool {
        let resync = self.was_connected && self.connection == ConnectionState::Disconnected;
        self.connection = ConnectionState::Connected;
        self.was_connected = true;
        resync
    }

    pub fn handle_disconnect(&mut self) {
        self.connection = ConnectionState::Disconnected;
        self.peer_focus.clear();
    }

    /// Broadcast a local mutation. Disconnected or transport-less relays
    /// drop the event; the local store already holds the change.
    pub fn emit_update(&self, field_id: &FieldId, property: PropertyKey, value: String) {
        let Some(transport) = self.transport.as_deref() else {
            return;
        };
        if self.connection != ConnectionState::Connected {
            tracing::debug!(field_id = %field_id, "not connected, field update not broadcast");
            return;
        }
        let update = FieldUpdate {
            field_id: field_id.clone(),
            property,
            value,
            session_id: self.session.clone(),
        };
        if let Err(err) = transport.publish_update(&update) {
            tracing::warn!(%err, field_id = %field_id, "failed to broadcast field update");
        }
    }

    pub fn emit_presence(&self, field_id: &FieldId, action: PresenceAction) {
        let Some(transport) = self.transport.as_deref() else {
            return;
        };
        if self.connection != ConnectionState::Connected {
            return;
        }
        let event = PresenceEvent {
            field_id: field_id.clone(),
            session_id: self.session.clone(),
            action,
        };
        if let Err(err) = transport.publish_presence(&event) {
            tracing::warn!(%err, field_id = %event.field_id, "failed to broadcast presence");
        }
    }

    /// Apply a remote mutation to the store, without re-emission.
    /// `active_gesture` is the field currently being dragged/resized locally,
    /// if any; updates to it are dropped until the gesture completes.
    pub fn apply_remote_update(
        &mut self,
        store: &mut FieldStore,
        update: &FieldUpdate,
        active_gesture: Option<&FieldId>,
    ) -> RemoteOutcome {
        if update.session_id == self.session {
            return RemoteOutcome::OwnEcho;
        }
        if active_gesture == Some(&update.field_id) {
            tracing::debug!(
                field_id = %update.field_id,
                "remote update dropped, field is mid-gesture locally"
            );
            return RemoteOutcome::LocalGestureWins;
        }
        match store.update(&update.field_id, update.property, &update.value) {
            UpdateOutcome::Applied => RemoteOutcome::Applied,
            UpdateOutcome::NotFound => RemoteOutcome::UnknownField,
            UpdateOutcome::InvalidValue => RemoteOutcome::InvalidValue,
        }
    }

    /// Track which peer is editing which field. Echo-suppressed like updates.
    pub fn apply_remote_presence(&mut self, event: &PresenceEvent) -> bool {
        if event.session_id == self.session {
            return false;
        }
        match event.action {
            PresenceAction::Focus => {
                self.peer_focus
                    .insert(event.field_id.clone(), event.session_id.clone());
            }
            PresenceAction::Blur => {
                // Only the peer that focused the field may release it.
                if self.peer_focus.get(&event.field_id) == Some(&event.session_id) {
                    self.peer_focus.remove(&event.field_id);
                }
            }
        }
        true
    }

    pub fn peer_editing(&self, field_id: &FieldId) -> Option<&SessionId> {
        self.peer_focus.get(field_id)
    }
}

/// mpsc-backed transport; enough for in-process fan-out and tests. A socket
/// implementation lives outside this crate.
pub struct ChannelTransport {
    update_tx: Sender<FieldUpdate>,
    presence_tx: Sender<PresenceEvent>,
}

impl ChannelTransport {
    pub fn new(update_tx: Sender<FieldUpdate>, presence_tx: Sender<PresenceEvent>) -> Self {
        Self {
            update_tx,
            presence_tx,
        }
    }
}

impl RealtimeTransport for ChannelTransport {
    fn publish_update(&self, update: &FieldUpdate) -> Result<(), TransportError> {
        self.update_tx
            .send(update.clone())
            .map_err(|err| TransportError::Failed(err.to_string()))
    }

    fn publish_presence(&self, event: &PresenceEvent) -> Result<(), TransportError> {
        self.presence_tx
            .send(event.clone())
            .map_err(|err| TransportError::Failed(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldKind, FieldOwner};
    use std::sync::mpsc::{channel, Receiver};

    fn connected_relay() -> (CollaborationRelay, Receiver<FieldUpdate>, Receiver<PresenceEvent>) {
        let (update_tx, update_rx) = channel();
        let (presence_tx, presence_rx) = channel();
        let mut relay = CollaborationRelay::with_transport(
            SessionId::new("s1"),
            Box::new(ChannelTransport::new(update_tx, presence_tx)),
        );
        relay.handle_connect();
        (relay, update_rx, presence_rx)
    }

    fn remote_update(field_id: &FieldId, session: &str, value: &str) -> FieldUpdate {
        FieldUpdate {
            field_id: field_id.clone(),
            property: PropertyKey::Value,
            value: value.to_string(),
            session_id: SessionId::new(session),
        }
    }

    #[test]
    fn emit_update_carries_local_session_id() {
        let (relay, update_rx, _presence_rx) = connected_relay();
        relay.emit_update(&FieldId::new("f1"), PropertyKey::Name, "Renamed".to_string());

        let sent = update_rx.try_recv().expect("update published");
        assert_eq!(sent.session_id, SessionId::new("s1"));
        assert_eq!(sent.property, PropertyKey::Name);
        assert_eq!(sent.value, "Renamed");
    }

    #[test]
    fn disconnected_relay_does_not_broadcast() {
        let (mut relay, update_rx, _presence_rx) = connected_relay();
        relay.handle_disconnect();
        relay.emit_update(&FieldId::new("f1"), PropertyKey::Name, "x".to_string());
        assert!(update_rx.try_recv().is_err());
    }

    #[test]
    fn own_echo_is_suppressed() {
        let (mut relay, _update_rx, _presence_rx) = connected_relay();
        let mut store = FieldStore::new(FieldOwner::User1);
        let id = store.add(FieldKind::Text, 0).id().clone();
        store.update(&id, PropertyKey::Value, "X");
        let updated_at = store.get(&id).expect("field").updated_at;

        let echo = remote_update(&id, "s1", "X");
        assert_eq!(
            relay.apply_remote_update(&mut store, &echo, None),
            RemoteOutcome::OwnEcho
        );
        // The locally applied mutation is untouched.
        let field = store.get(&id).expect("field");
        assert_eq!(field.value, "X");
        assert_eq!(field.updated_at, updated_at);
    }

    #[test]
    fn remote_update_from_peer_is_applied() {
        let (mut relay, _update_rx, _presence_rx) = connected_relay();
        let mut store = FieldStore::new(FieldOwner::User1);
        let id = store.add(FieldKind::Text, 0).id().clone();

        let update = remote_update(&id, "s2", "from peer");
        assert_eq!(
            relay.apply_remote_update(&mut store, &update, None),
            RemoteOutcome::Applied
        );
        assert_eq!(store.get(&id).expect("field").value, "from peer");
    }

    #[test]
    fn remote_update_to_field_mid_gesture_is_dropped() {
        let (mut relay, _update_rx, _presence_rx) = connected_relay();
        let mut store = FieldStore::new(FieldOwner::User1);
        let dragged = store.add(FieldKind::Text, 0).id().clone();
        let other = store.add(FieldKind::Text, 0).id().clone();

        let update = remote_update(&dragged, "s2", "clobber");
        assert_eq!(
            relay.apply_remote_update(&mut store, &update, Some(&dragged)),
            RemoteOutcome::LocalGestureWins
        );
        assert_eq!(store.get(&dragged).expect("field").value, "");

        // Updates to other fields still land during the gesture.
        let update = remote_update(&other, "s2", "fine");
        assert_eq!(
            relay.apply_remote_update(&mut store, &update, Some(&dragged)),
            RemoteOutcome::Applied
        );
    }

    #[test]
    fn remote_update_for_unknown_field_is_silent() {
        let (mut relay, _update_rx, _presence_rx) = connected_relay();
        let mut store = FieldStore::new(FieldOwner::User1);
        let update = remote_update(&FieldId::new("ghost"), "s2", "x");
        assert_eq!(
            relay.apply_remote_update(&mut store, &update, None),
            RemoteOutcome::UnknownField
        );
    }

    #[test]
    fn presence_tracks_peer_focus_and_blur() {
        let (mut relay, _update_rx, _presence_rx) = connected_relay();
        let field = FieldId::new("f1");

        let focus = PresenceEvent {
            field_id: field.clone(),
            session_id: SessionId::new("s2"),
            action: PresenceAction::Focus,
        };
        assert!(relay.apply_remote_presence(&focus));
        assert_eq!(relay.peer_editing(&field), Some(&SessionId::new("s2")));

        // A different peer's blur does not release s2's focus.
        let foreign_blur = PresenceEvent {
            field_id: field.clone(),
            session_id: SessionId::new("s3"),
            action: PresenceAction::Blur,
        };
        relay.apply_remote_presence(&foreign_blur);
        assert_eq!(relay.peer_editing(&field), Some(&SessionId::new("s2")));

        let blur = PresenceEvent {
            field_id: field.clone(),
            session_id: SessionId::new("s2"),
            action: PresenceAction::Blur,
        };
        relay.apply_remote_presence(&blur);
        assert_eq!(relay.peer_editing(&field), None);
    }

    #[test]
    fn own_presence_echo_is_ignored() {
        let (mut relay, _update_rx, _presence_rx) = connected_relay();
        let event = PresenceEvent {
            field_id: FieldId::new("f1"),
            session_id: SessionId::new("s1"),
            action: PresenceAction::Focus,
        };
        assert!(!relay.apply_remote_presence(&event));
        assert_eq!(relay.peer_editing(&FieldId::new("f1")), None);
    }

    #[test]
    fn reconnect_after_drop_requires_resync() {
        let (mut relay, _update_rx, _presence_rx) = connected_relay();
        assert_eq!(relay.connection(), ConnectionState::Connected);
        relay.handle_disconnect();
        assert!(relay.handle_connect());
    }

    #[test]
    fn first_connect_is_not_a_resync() {
        let mut relay = CollaborationRelay::new(SessionId::new("s1"));
        assert!(!relay.handle_connect());
    }
}
