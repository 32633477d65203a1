//! Raw entity shapes as recorded by `#[base_model]`.
//!
//! A shape is the unvalidated declaration of one entity: its markers, its
//! fields in declaration order, and the per-field annotations. The descriptor
//! builder turns shapes into validated [`super::EntityDescriptor`]s; nothing
//! here touches storage.

/// Declared scalar of one persisted field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarShape {
    Uuid,
    Str,
    Int,
    Bool,
    DateTime,
    Bytes,
    Json,
    Unsupported(String),
}

/// Struct-level markers carried by an entity declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeMarker {
    /// The entity embeds the shared base columns (id + timestamps).
    BaseModel,
    /// Every access to the entity requires the named capability.
    RequiresCapability(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldShape {
    pub name: String,
    pub scalar: ScalarShape,
    pub nullable: bool,
    pub unique: bool,
    pub indexed: bool,
    pub fixed_len: Option<u32>,
    pub max_len: Option<u32>,
    pub text: bool,
    pub requires: Vec<String>,
}

impl FieldShape {
    pub fn new(name: impl Into<String>, scalar: ScalarShape) -> Self {
        Self {
            name: name.into(),
            scalar,
            nullable: false,
            unique: false,
            indexed: false,
            fixed_len: None,
            max_len: None,
            text: false,
            requires: Vec::new(),
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    pub fn fixed_len(mut self, len: u32) -> Self {
        self.fixed_len = Some(len);
        self
    }

    pub fn max_len(mut self, len: u32) -> Self {
        self.max_len = Some(len);
        self
    }

    pub fn text(mut self) -> Self {
        self.text = true;
        self
    }

    pub fn requires(mut self, capability: impl Into<String>) -> Self {
        self.requires.push(capability.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityShape {
    pub name: String,
    pub table: String,
    pub markers: Vec<ShapeMarker>,
    pub fields: Vec<FieldShape>,
}

impl EntityShape {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            markers: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn push_marker(&mut self, marker: ShapeMarker) {
        self.markers.push(marker);
    }

    pub fn push_field(&mut self, field: FieldShape) {
        self.fields.push(field);
    }
}

/// Implemented by `#[base_model]` on each entity so the declared shape can be
/// reflected over at runtime.
pub trait HasModelShape {
    fn model_shape() -> EntityShape;
}

/// Display name of an entity, derived from the tail of its module path:
/// `cms_backend::db::entities::api_key` becomes `ApiKey`.
pub fn entity_name_from_module(module_path: &str) -> String {
    let tail = module_path.rsplit("::").next().unwrap_or(module_path);
    to_pascal_case(tail)
}

fn to_pascal_case(value: &str) -> String {
    if !value.contains('_') && !value.contains('-') {
        let has_upper = value.chars().any(|ch| ch.is_uppercase());
        if has_upper {
            return value.to_string();
        }
    }

    let mut out = String::new();
    for part in value.split(|ch| ch == '_' || ch == '-') {
        if part.is_empty() {
            continue;
        }
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            for ch in chars {
                out.extend(ch.to_lowercase());
            }
        }
    }
    out
}
