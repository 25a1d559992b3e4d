//! Name-based field access for every node variant.
//!
//! The registry is built once, up front, and holds one [`VariantTable`] per
//! [`NodeKind`]. Callers that only know a field by name (the script
//! boundary) resolve it here and get back a typed [`FieldValue`].

use crate::NodeError;
use crate::arena::{NodeArena, NodeId};
use crate::kind::NodeKind;
use crate::variants::{Container, Glue, Glyph, HList, ImageNode, LangNode, NodeVariant, Penalty, VList};
use ets_types::{FontRef, ImageRef, LangRef, ScaledPoint};
use std::collections::BTreeMap;
use std::fmt;

/// The shape of value a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Scaled,
    Bool,
    Text,
    Ratio,
    Node,
    Font,
    Image,
    Lang,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Int => "integer",
            FieldKind::Scaled => "scaled distance",
            FieldKind::Bool => "boolean",
            FieldKind::Text => "string",
            FieldKind::Ratio => "number",
            FieldKind::Node => "node",
            FieldKind::Font => "font",
            FieldKind::Image => "image",
            FieldKind::Lang => "language",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Nil,
    Int(i64),
    Scaled(ScaledPoint),
    Bool(bool),
    Text(String),
    Ratio(f64),
    Node(NodeId),
    Font(FontRef),
    Image(ImageRef),
    Lang(LangRef),
}

impl FieldValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Nil => "nil",
            FieldValue::Int(_) => "integer",
            FieldValue::Scaled(_) => "scaled distance",
            FieldValue::Bool(_) => "boolean",
            FieldValue::Text(_) => "string",
            FieldValue::Ratio(_) => "number",
            FieldValue::Node(_) => "node",
            FieldValue::Font(_) => "font",
            FieldValue::Image(_) => "image",
            FieldValue::Lang(_) => "language",
        }
    }

    fn matches(&self, kind: FieldKind) -> bool {
        matches!(
            (self, kind),
            (FieldValue::Int(_), FieldKind::Int)
                | (FieldValue::Scaled(_), FieldKind::Scaled)
                | (FieldValue::Bool(_), FieldKind::Bool)
                | (FieldValue::Text(_), FieldKind::Text)
                | (FieldValue::Ratio(_), FieldKind::Ratio)
                | (FieldValue::Node(_), FieldKind::Node)
                | (FieldValue::Font(_), FieldKind::Font)
                | (FieldValue::Image(_), FieldKind::Image)
                | (FieldValue::Lang(_), FieldKind::Lang)
        )
    }
}

type Getter = Box<dyn Fn(&NodeArena, NodeId) -> FieldValue>;
type Setter = Box<dyn Fn(&mut NodeArena, NodeId, FieldValue) -> Result<(), NodeError>>;

/// One named field: its value shape plus accessor and optional mutator.
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Whether `Nil` is an accepted value (links and references).
    pub nullable: bool,
    get: Getter,
    set: Option<Setter>,
}

impl Field {
    pub fn is_writable(&self) -> bool {
        self.set.is_some()
    }

    pub fn accepts(&self, value: &FieldValue) -> bool {
        match value {
            FieldValue::Nil => self.nullable,
            other => other.matches(self.kind),
        }
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("nullable", &self.nullable)
            .field("writable", &self.is_writable())
            .finish()
    }
}

/// The fields of one variant, ordered by name.
#[derive(Debug)]
pub struct VariantTable {
    pub kind: NodeKind,
    fields: BTreeMap<&'static str, Field>,
}

impl VariantTable {
    fn new(kind: NodeKind) -> Self {
        let mut table = Self {
            kind,
            fields: BTreeMap::new(),
        };
        table.insert(link("next", NodeArena::next, NodeArena::set_next));
        table.insert(link("prev", NodeArena::prev, NodeArena::set_prev));
        table
    }

    fn insert(&mut self, field: Field) {
        self.fields.insert(field.name, field);
    }

    fn with(mut self, field: Field) -> Self {
        self.insert(field);
        self
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.keys().copied()
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }
}

/// Per-variant field tables for all node kinds.
#[derive(Debug)]
pub struct TypeRegistry {
    tables: BTreeMap<NodeKind, VariantTable>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        let tables = [
            VariantTable::new(NodeKind::Disc),
            VariantTable::new(NodeKind::Glue)
                .with(scaled::<Glue>("width", |g| g.width, |g, v| g.width = v))
                .with(scaled::<Glue>("stretch", |g| g.stretch, |g, v| g.stretch = v))
                .with(scaled::<Glue>("shrink", |g| g.shrink, |g, v| g.shrink = v)),
            VariantTable::new(NodeKind::Glyph)
                .with(int::<Glyph>("codepoint", |g| g.codepoint, |g, v| g.codepoint = v))
                .with(text::<Glyph>("components", |g| &g.components, |g, v| g.components = v))
                .with(reference::<Glyph, FontRef>("font", |g| g.font, |g, v| g.font = v))
                .with(scaled::<Glyph>("width", |g| g.width, |g, v| g.width = v))
                .with(scaled::<Glyph>("height", |g| g.height, |g, v| g.height = v))
                .with(scaled::<Glyph>("depth", |g| g.depth, |g, v| g.depth = v)),
            VariantTable::new(NodeKind::HList)
                .with(nested::<HList>())
                .with(scaled::<HList>("width", |h| h.width, |h, v| h.width = v))
                .with(scaled::<HList>("height", |h| h.height, |h, v| h.height = v))
                .with(scaled::<HList>("depth", |h| h.depth, |h, v| h.depth = v))
                .with(read_only::<HList>("glueset", FieldKind::Ratio, |h| FieldValue::Ratio(h.glue_set))),
            VariantTable::new(NodeKind::Image)
                .with(reference::<ImageNode, ImageRef>("img", |i| i.img, |i, v| i.img = v))
                .with(scaled::<ImageNode>("width", |i| i.width, |i, v| i.width = v))
                .with(scaled::<ImageNode>("height", |i| i.height, |i, v| i.height = v)),
            VariantTable::new(NodeKind::Lang)
                .with(reference::<LangNode, LangRef>("lang", |l| l.lang, |l, v| l.lang = v)),
            VariantTable::new(NodeKind::Penalty)
                .with(int::<Penalty>("penalty", |p| p.penalty, |p, v| p.penalty = v))
                .with(boolean::<Penalty>("flagged", |p| p.flagged, |p, v| p.flagged = v))
                .with(scaled::<Penalty>("width", |p| p.width, |p, v| p.width = v)),
            VariantTable::new(NodeKind::VList)
                .with(nested::<VList>())
                .with(scaled::<VList>("width", |v| v.width, |v, x| v.width = x))
                .with(scaled::<VList>("height", |v| v.height, |v, x| v.height = x))
                .with(scaled::<VList>("depth", |v| v.depth, |v, x| v.depth = x)),
        ];
        Self {
            tables: tables.into_iter().map(|t| (t.kind, t)).collect(),
        }
    }

    pub fn table(&self, kind: NodeKind) -> Option<&VariantTable> {
        self.tables.get(&kind)
    }

    pub fn field(&self, kind: NodeKind, name: &str) -> Option<&Field> {
        self.table(kind)?.field(name)
    }

    /// Kinds that declare a field called `name`.
    pub fn owners_of(&self, name: &str) -> Vec<NodeKind> {
        self.tables
            .values()
            .filter(|t| t.field(name).is_some())
            .map(|t| t.kind)
            .collect()
    }

    /// Reads a field by name. Names the variant does not declare read as `Nil`.
    pub fn get(&self, arena: &NodeArena, id: NodeId, name: &str) -> FieldValue {
        match self.field(arena.kind(id), name) {
            Some(field) => (field.get)(arena, id),
            None => FieldValue::Nil,
        }
    }

    /// Finds the writable field `name` on `kind`.
    ///
    /// A name declared only by other variants is a [`NodeError::TypeMismatch`]
    /// against the first such variant; a name nobody declares is
    /// [`NodeError::UnknownField`].
    pub fn writable(&self, kind: NodeKind, name: &str) -> Result<&Field, NodeError> {
        let Some(field) = self.field(kind, name) else {
            return Err(match self.owners_of(name).first() {
                Some(&expected) => NodeError::TypeMismatch { expected, found: kind },
                None => NodeError::UnknownField {
                    kind,
                    field: name.to_string(),
                },
            });
        };
        if !field.is_writable() {
            return Err(NodeError::ReadOnlyField {
                kind,
                field: name.to_string(),
            });
        }
        Ok(field)
    }

    pub fn set(&self, arena: &mut NodeArena, id: NodeId, name: &str, value: FieldValue) -> Result<(), NodeError> {
        let kind = arena.kind(id);
        let field = self.writable(kind, name)?;
        if !field.accepts(&value) {
            return Err(NodeError::InvalidFieldType {
                kind,
                field: name.to_string(),
                expected: field.kind,
                found: value.type_name(),
            });
        }
        log::trace!("set {kind} {id}.{name} = {value:?}");
        match &field.set {
            Some(set) => set(arena, id, value),
            None => Err(NodeError::ReadOnlyField {
                kind,
                field: name.to_string(),
            }),
        }
    }
}

fn mismatch(kind: NodeKind, name: &str, expected: FieldKind, value: &FieldValue) -> NodeError {
    NodeError::InvalidFieldType {
        kind,
        field: name.to_string(),
        expected,
        found: value.type_name(),
    }
}

fn link(
    name: &'static str,
    get: fn(&NodeArena, NodeId) -> Option<NodeId>,
    set: fn(&mut NodeArena, NodeId, Option<NodeId>),
) -> Field {
    Field {
        name,
        kind: FieldKind::Node,
        nullable: true,
        get: Box::new(move |arena, id| get(arena, id).map_or(FieldValue::Nil, FieldValue::Node)),
        set: Some(Box::new(move |arena, id, value| {
            match value {
                FieldValue::Node(other) => set(arena, id, Some(other)),
                FieldValue::Nil => set(arena, id, None),
                other => return Err(mismatch(arena.kind(id), name, FieldKind::Node, &other)),
            }
            Ok(())
        })),
    }
}

/// The `list` field of containers. Refuses heads that would make the
/// container its own ancestor.
fn nested<T: Container>() -> Field {
    Field {
        name: "list",
        kind: FieldKind::Node,
        nullable: true,
        get: Box::new(|arena, id| {
            arena
                .get::<T>(id)
                .ok()
                .and_then(|c| c.list())
                .map_or(FieldValue::Nil, FieldValue::Node)
        }),
        set: Some(Box::new(|arena, id, value| {
            let head = match value {
                FieldValue::Node(head) => Some(head),
                FieldValue::Nil => None,
                other => return Err(mismatch(T::KIND, "list", FieldKind::Node, &other)),
            };
            if let Some(head) = head
                && arena.reaches(head, id)
            {
                return Err(NodeError::CycleDetected { kind: T::KIND, id });
            }
            arena.get_mut::<T>(id)?.set_list(head);
            Ok(())
        })),
    }
}

fn read_only<T: NodeVariant>(name: &'static str, kind: FieldKind, get: fn(&T) -> FieldValue) -> Field {
    Field {
        name,
        kind,
        nullable: false,
        get: Box::new(move |arena, id| arena.get::<T>(id).map_or(FieldValue::Nil, get)),
        set: None,
    }
}

macro_rules! typed_field {
    ($fn_name:ident, $ty:ty, $field_kind:ident, $variant:ident) => {
        fn $fn_name<T: NodeVariant>(name: &'static str, get: fn(&T) -> $ty, set: fn(&mut T, $ty)) -> Field {
            Field {
                name,
                kind: FieldKind::$field_kind,
                nullable: false,
                get: Box::new(move |arena, id| {
                    arena
                        .get::<T>(id)
                        .map_or(FieldValue::Nil, |node| FieldValue::$variant(get(node)))
                }),
                set: Some(Box::new(move |arena, id, value| match value {
                    FieldValue::$variant(v) => {
                        set(arena.get_mut::<T>(id)?, v);
                        Ok(())
                    }
                    other => Err(mismatch(T::KIND, name, FieldKind::$field_kind, &other)),
                })),
            }
        }
    };
}

typed_field!(scaled, ScaledPoint, Scaled, Scaled);
typed_field!(int, i64, Int, Int);
typed_field!(boolean, bool, Bool, Bool);

fn text<T: NodeVariant>(name: &'static str, get: fn(&T) -> &String, set: fn(&mut T, String)) -> Field {
    Field {
        name,
        kind: FieldKind::Text,
        nullable: false,
        get: Box::new(move |arena, id| {
            arena
                .get::<T>(id)
                .map_or(FieldValue::Nil, |node| FieldValue::Text(get(node).clone()))
        }),
        set: Some(Box::new(move |arena, id, value| match value {
            FieldValue::Text(v) => {
                set(arena.get_mut::<T>(id)?, v);
                Ok(())
            }
            other => Err(mismatch(T::KIND, name, FieldKind::Text, &other)),
        })),
    }
}

/// Resource references that can be carried by a node.
trait RefValue: Copy + 'static {
    const KIND: FieldKind;

    fn wrap(self) -> FieldValue;

    fn unwrap_value(value: &FieldValue) -> Option<Self>;
}

macro_rules! ref_value {
    ($ty:ty, $variant:ident) => {
        impl RefValue for $ty {
            const KIND: FieldKind = FieldKind::$variant;

            fn wrap(self) -> FieldValue {
                FieldValue::$variant(self)
            }

            fn unwrap_value(value: &FieldValue) -> Option<Self> {
                match value {
                    FieldValue::$variant(r) => Some(*r),
                    _ => None,
                }
            }
        }
    };
}

ref_value!(FontRef, Font);
ref_value!(ImageRef, Image);
ref_value!(LangRef, Lang);

fn reference<T: NodeVariant, R: RefValue>(
    name: &'static str,
    get: fn(&T) -> Option<R>,
    set: fn(&mut T, Option<R>),
) -> Field {
    Field {
        name,
        kind: R::KIND,
        nullable: true,
        get: Box::new(move |arena, id| {
            arena
                .get::<T>(id)
                .ok()
                .and_then(get)
                .map_or(FieldValue::Nil, R::wrap)
        }),
        set: Some(Box::new(move |arena, id, value| {
            let r = match value {
                FieldValue::Nil => None,
                ref other => match R::unwrap_value(other) {
                    Some(r) => Some(r),
                    None => return Err(mismatch(T::KIND, name, R::KIND, other)),
                },
            };
            set(arena.get_mut::<T>(id)?, r);
            Ok(())
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ets_types::DocumentId;

    fn setup(kind: NodeKind) -> (TypeRegistry, NodeArena, NodeId) {
        let mut arena = NodeArena::new();
        let id = arena.new_node(kind);
        (TypeRegistry::new(), arena, id)
    }

    #[test]
    fn test_every_kind_has_link_fields() {
        let registry = TypeRegistry::new();
        for kind in NodeKind::ALL {
            let table = registry.table(kind).unwrap();
            assert!(table.field("next").is_some_and(Field::is_writable));
            assert!(table.field("prev").is_some_and(Field::is_writable));
        }
    }

    #[test]
    fn test_scaled_fields_round_trip() {
        let registry = TypeRegistry::new();
        let mut arena = NodeArena::new();
        for kind in NodeKind::ALL {
            let id = arena.new_node(kind);
            let names: Vec<_> = registry
                .table(kind)
                .unwrap()
                .fields()
                .filter(|f| f.kind == FieldKind::Scaled && f.is_writable())
                .map(|f| f.name)
                .collect();
            for (i, name) in names.into_iter().enumerate() {
                for raw in [0, 1, 65536 * (i as i64 + 3), 1 << 40] {
                    let v = FieldValue::Scaled(ScaledPoint(raw));
                    registry.set(&mut arena, id, name, v.clone()).unwrap();
                    assert_eq!(registry.get(&arena, id, name), v, "{kind}.{name}");
                }
            }
        }
    }

    #[test]
    fn test_glyph_fields_round_trip() {
        let (registry, mut arena, id) = setup(NodeKind::Glyph);
        let font = FontRef::new(DocumentId(0), 2);
        let values = [
            ("codepoint", FieldValue::Int(36)),
            ("components", FieldValue::Text("ffi".into())),
            ("font", FieldValue::Font(font)),
        ];
        for (name, v) in values {
            registry.set(&mut arena, id, name, v.clone()).unwrap();
            assert_eq!(registry.get(&arena, id, name), v);
        }
        registry.set(&mut arena, id, "font", FieldValue::Nil).unwrap();
        assert_eq!(registry.get(&arena, id, "font"), FieldValue::Nil);
    }

    #[test]
    fn test_penalty_fields_round_trip() {
        let (registry, mut arena, id) = setup(NodeKind::Penalty);
        registry.set(&mut arena, id, "penalty", FieldValue::Int(-10000)).unwrap();
        registry.set(&mut arena, id, "flagged", FieldValue::Bool(true)).unwrap();
        assert_eq!(arena.get::<Penalty>(id).unwrap().penalty, -10000);
        assert_eq!(registry.get(&arena, id, "flagged"), FieldValue::Bool(true));
    }

    #[test]
    fn test_unknown_read_is_nil() {
        let (registry, arena, id) = setup(NodeKind::Disc);
        assert_eq!(registry.get(&arena, id, "width"), FieldValue::Nil);
        assert_eq!(registry.get(&arena, id, "next"), FieldValue::Nil);
    }

    #[test]
    fn test_glyph_field_on_glue_is_type_mismatch() {
        let (registry, mut arena, id) = setup(NodeKind::Glue);
        let err = registry.set(&mut arena, id, "codepoint", FieldValue::Int(65)).unwrap_err();
        assert_eq!(
            err,
            NodeError::TypeMismatch {
                expected: NodeKind::Glyph,
                found: NodeKind::Glue
            }
        );
    }

    #[test]
    fn test_unknown_write_is_rejected() {
        let (registry, mut arena, id) = setup(NodeKind::Glue);
        let err = registry.set(&mut arena, id, "colour", FieldValue::Int(1)).unwrap_err();
        assert!(matches!(err, NodeError::UnknownField { .. }));
    }

    #[test]
    fn test_wrong_shape_is_invalid_field_type() {
        let (registry, mut arena, id) = setup(NodeKind::Glyph);
        let err = registry
            .set(&mut arena, id, "width", FieldValue::Text("wide".into()))
            .unwrap_err();
        assert!(matches!(
            err,
            NodeError::InvalidFieldType {
                expected: FieldKind::Scaled,
                found: "string",
                ..
            }
        ));
        let err = registry.set(&mut arena, id, "codepoint", FieldValue::Nil).unwrap_err();
        assert!(matches!(err, NodeError::InvalidFieldType { .. }));
    }

    #[test]
    fn test_glueset_is_read_only() {
        let (registry, mut arena, id) = setup(NodeKind::HList);
        assert_eq!(registry.get(&arena, id, "glueset"), FieldValue::Ratio(0.0));
        let err = registry.set(&mut arena, id, "glueset", FieldValue::Ratio(1.0)).unwrap_err();
        assert!(matches!(err, NodeError::ReadOnlyField { .. }));
    }

    #[test]
    fn test_prev_writes_prev_link() {
        let (registry, mut arena, a) = setup(NodeKind::Glyph);
        let b = arena.new_node(NodeKind::Glue);
        registry.set(&mut arena, b, "prev", FieldValue::Node(a)).unwrap();
        assert_eq!(arena.prev(b), Some(a));
        assert_eq!(arena.next(b), None);
        registry.set(&mut arena, b, "prev", FieldValue::Nil).unwrap();
        assert_eq!(registry.get(&arena, b, "prev"), FieldValue::Nil);
    }

    #[test]
    fn test_list_rejects_self_ancestry() {
        let (registry, mut arena, outer) = setup(NodeKind::VList);
        let inner = arena.new_node(NodeKind::HList);
        registry.set(&mut arena, outer, "list", FieldValue::Node(inner)).unwrap();
        assert_eq!(
            registry.set(&mut arena, inner, "list", FieldValue::Node(outer)),
            Err(NodeError::CycleDetected {
                kind: NodeKind::HList,
                id: inner
            })
        );
        assert!(registry.set(&mut arena, inner, "list", FieldValue::Node(inner)).is_err());
        assert_eq!(registry.get(&arena, outer, "list"), FieldValue::Node(inner));
    }
}
