//! Field overlay editing model for collaborative document form filling.
//!
//! Fields live in unscaled document coordinates inside a [`store::FieldStore`];
//! [`geometry`] maps them to screen space for the current zoom level,
//! [`input`] drives drag/resize gestures, [`relay`] mirrors mutations between
//! peers with echo suppression, and [`service::EditorSession`] ties the
//! pieces together behind abstract document collaborators.

pub mod document_store;
pub mod geometry;
pub mod input;
pub mod logging;
pub mod messages;
pub mod model;
pub mod notify;
pub mod properties;
pub mod relay;
pub mod render;
pub mod service;
pub mod store;
