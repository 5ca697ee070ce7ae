use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Minimum interactive hit-target size, enforced whenever width/height change.
pub const MIN_FIELD_WIDTH: f32 = 50.0;
pub const MIN_FIELD_HEIGHT: f32 = 20.0;

pub const DEFAULT_FIELD_X: f32 = 100.0;
pub const DEFAULT_FIELD_Y: f32 = 100.0;

/// Provenance tag for fields added through the toolbar rather than loaded
/// from a document source.
pub const SOURCE_USER_CREATED: &str = "user_created";

const ID_SUFFIX_LEN: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(String);

impl FieldId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh id in the form `field_<millis>_<alnum>`. Uniqueness within a
    /// store is re-checked by the store itself.
    pub fn generate() -> Self {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(ID_SUFFIX_LEN)
            .map(char::from)
            .collect();
        Self(format!("field_{}_{}", Utc::now().timestamp_millis(), suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Email,
    Tel,
    Date,
    Textarea,
    Checkbox,
    Signature,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Tel => "tel",
            Self::Date => "date",
            Self::Textarea => "textarea",
            Self::Checkbox => "checkbox",
            Self::Signature => "signature",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Some(match value {
            "text" => Self::Text,
            "email" => Self::Email,
            "tel" => Self::Tel,
            "date" => Self::Date,
            "textarea" => Self::Textarea,
            "checkbox" => Self::Checkbox,
            "signature" => Self::Signature,
            _ => return None,
        })
    }

    /// Default width/height for a freshly created field of this kind.
    pub fn default_size(self) -> (f32, f32) {
        match self {
            Self::Textarea => (300.0, 80.0),
            _ => (200.0, 30.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldOwner {
    User1,
    User2,
    Admin,
}

impl FieldOwner {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User1 => "user1",
            Self::User2 => "user2",
            Self::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Some(match value {
            "user1" => Self::User1,
            "user2" => Self::User2,
            "admin" => Self::Admin,
            _ => return None,
        })
    }
}

/// Unscaled document coordinates, independent of the current zoom level.
/// `page` is 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldPosition {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub page: u32,
}

impl FieldPosition {
    pub fn new_default(kind: FieldKind, page: u32) -> Self {
        let (width, height) = kind.default_size();
        Self {
            x: DEFAULT_FIELD_X,
            y: DEFAULT_FIELD_Y,
            width,
            height,
            page,
        }
    }

    /// Clamp to the document origin: fields cannot sit above/left of (0, 0).
    pub fn clamp_origin(&mut self) {
        self.x = self.x.max(0.0);
        self.y = self.y.max(0.0);
    }

    /// Clamp to the minimum hit-target size.
    pub fn clamp_size(&mut self) {
        self.width = self.width.max(MIN_FIELD_WIDTH);
        self.height = self.height.max(MIN_FIELD_HEIGHT);
    }
}

/// Mutable field attributes addressed by their wire name. The relay carries
/// every update as a `(property, value)` string pair so the shape stays
/// transport-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKey {
    Name,
    #[serde(rename = "type")]
    Kind,
    Value,
    AssignedTo,
    IsRequired,
    X,
    Y,
    Width,
    Height,
    Page,
}

impl PropertyKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Kind => "type",
            Self::Value => "value",
            Self::AssignedTo => "assigned_to",
            Self::IsRequired => "is_required",
            Self::X => "x",
            Self::Y => "y",
            Self::Width => "width",
            Self::Height => "height",
            Self::Page => "page",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Some(match value {
            "name" => Self::Name,
            "type" => Self::Kind,
            "value" => Self::Value,
            "assigned_to" => Self::AssignedTo,
            "is_required" => Self::IsRequired,
            "x" => Self::X,
            "y" => Self::Y,
            "width" => Self::Width,
            "height" => Self::Height,
            "page" => Self::Page,
            _ => return None,
        })
    }
}

/// A named, positioned, typed input placeholder overlaid on a document page.
///
/// `id` and `source` are fixed at construction; everything else mutates
/// through [`Field::apply`] or the geometry setters, each of which refreshes
/// `updated_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    id: FieldId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub value: String,
    pub position: FieldPosition,
    pub assigned_to: FieldOwner,
    pub is_required: bool,
    source: String,
    pub updated_at: DateTime<Utc>,
}

impl Field {
    pub fn new(id: FieldId, kind: FieldKind, assigned_to: FieldOwner, page: u32) -> Self {
        Self {
            id,
            name: format!("New {} field", kind.as_str()),
            kind,
            value: String::new(),
            position: FieldPosition::new_default(kind, page),
            assigned_to,
            is_required: false,
            source: SOURCE_USER_CREATED.to_string(),
            updated_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &FieldId {
        &self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Apply a string-valued property update. Geometry writes keep the origin
    /// and minimum-size invariants; unparseable values are reported instead
    /// of being stored.
    pub fn apply(&mut self, key: PropertyKey, value: &str) -> Result<(), InvalidPropertyValue> {
        match key {
            PropertyKey::Name => self.name = value.to_string(),
            PropertyKey::Kind => {
                self.kind = FieldKind::parse(value).ok_or_else(|| invalid(key, value))?;
            }
            PropertyKey::Value => self.value = value.to_string(),
            PropertyKey::AssignedTo => {
                self.assigned_to = FieldOwner::parse(value).ok_or_else(|| invalid(key, value))?;
            }
            PropertyKey::IsRequired => {
                self.is_required = match value {
                    "true" => true,
                    "false" => false,
                    _ => return Err(invalid(key, value)),
                };
            }
            PropertyKey::X => {
                self.position.x = parse_coord(key, value)?;
                self.position.clamp_origin();
            }
            PropertyKey::Y => {
                self.position.y = parse_coord(key, value)?;
                self.position.clamp_origin();
            }
            PropertyKey::Width => {
                self.position.width = parse_coord(key, value)?;
                self.position.clamp_size();
            }
            PropertyKey::Height => {
                self.position.height = parse_coord(key, value)?;
                self.position.clamp_size();
            }
            PropertyKey::Page => {
                self.position.page = value.parse().map_err(|_| invalid(key, value))?;
            }
        }
        self.touch();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPropertyValue {
    pub key: PropertyKey,
    pub value: String,
}

impl std::fmt::Display for InvalidPropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid value {:?} for property {}", self.value, self.key.as_str())
    }
}

impl std::error::Error for InvalidPropertyValue {}

fn invalid(key: PropertyKey, value: &str) -> InvalidPropertyValue {
    InvalidPropertyValue {
        key,
        value: value.to_string(),
    }
}

fn parse_coord(key: PropertyKey, value: &str) -> Result<f32, InvalidPropertyValue> {
    let parsed: f32 = value.parse().map_err(|_| invalid(key, value))?;
    if !parsed.is_finite() {
        return Err(invalid(key, value));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(kind: FieldKind) -> Field {
        Field::new(FieldId::new("f1"), kind, FieldOwner::User1, 0)
    }

    #[test]
    fn textarea_gets_large_default_geometry() {
        let field = field(FieldKind::Textarea);
        assert_eq!(field.position.width, 300.0);
        assert_eq!(field.position.height, 80.0);
    }

    #[test]
    fn non_textarea_kinds_share_standard_default_geometry() {
        for kind in [
            FieldKind::Text,
            FieldKind::Email,
            FieldKind::Tel,
            FieldKind::Date,
            FieldKind::Checkbox,
            FieldKind::Signature,
        ] {
            let field = field(kind);
            assert_eq!(field.position.width, 200.0);
            assert_eq!(field.position.height, 30.0);
            assert_eq!(field.position.x, DEFAULT_FIELD_X);
            assert_eq!(field.position.y, DEFAULT_FIELD_Y);
        }
    }

    #[test]
    fn new_field_name_includes_kind() {
        assert_eq!(field(FieldKind::Signature).name, "New signature field");
    }

    #[test]
    fn apply_clamps_geometry_to_invariants() {
        let mut field = field(FieldKind::Text);
        field.apply(PropertyKey::X, "-25").expect("apply x");
        field.apply(PropertyKey::Width, "10").expect("apply width");
        field.apply(PropertyKey::Height, "5").expect("apply height");
        assert_eq!(field.position.x, 0.0);
        assert_eq!(field.position.width, MIN_FIELD_WIDTH);
        assert_eq!(field.position.height, MIN_FIELD_HEIGHT);
    }

    #[test]
    fn apply_rejects_unparseable_values() {
        let mut field = field(FieldKind::Text);
        assert!(field.apply(PropertyKey::Kind, "dropdown").is_err());
        assert!(field.apply(PropertyKey::IsRequired, "maybe").is_err());
        assert!(field.apply(PropertyKey::X, "left").is_err());
        assert!(field.apply(PropertyKey::X, "NaN").is_err());
        // Unchanged on failure.
        assert_eq!(field.kind, FieldKind::Text);
        assert_eq!(field.position.x, DEFAULT_FIELD_X);
    }

    #[test]
    fn checkbox_value_roundtrips_boolean_strings() {
        let mut field = field(FieldKind::Checkbox);
        field.apply(PropertyKey::Value, "true").expect("apply value");
        assert_eq!(field.value, "true");
        field.apply(PropertyKey::Value, "false").expect("apply value");
        assert_eq!(field.value, "false");
    }

    #[test]
    fn property_keys_roundtrip_wire_names() {
        for key in [
            PropertyKey::Name,
            PropertyKey::Kind,
            PropertyKey::Value,
            PropertyKey::AssignedTo,
            PropertyKey::IsRequired,
            PropertyKey::X,
            PropertyKey::Y,
            PropertyKey::Width,
            PropertyKey::Height,
            PropertyKey::Page,
        ] {
            assert_eq!(PropertyKey::parse(key.as_str()), Some(key));
        }
        assert_eq!(PropertyKey::parse("font"), None);
    }

    #[test]
    fn field_serializes_with_snake_case_wire_keys() {
        let json = serde_json::to_value(field(FieldKind::Checkbox)).expect("serialize");
        assert_eq!(json["type"], "checkbox");
        assert_eq!(json["assigned_to"], "user1");
        assert_eq!(json["source"], "user_created");
        assert_eq!(json["position"]["page"], 0);
    }

    #[test]
    fn generated_ids_are_distinct() {
        let a = FieldId::generate();
        let b = FieldId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("field_"));
    }
}
