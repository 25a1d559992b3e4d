//! Conversions between Lua values and engine values.

use crate::document::DocumentHandle;
use crate::error::bad_argument;
use crate::font::{FaceHandle, FamilyHandle, FontHandle};
use crate::image::{ImageFileHandle, ImageHandle};
use crate::language::LangHandle;
use crate::node::NodeHandle;
use crate::page::PageHandle;
use crate::properties::Handle;
use ets_node::{FieldKind, FieldValue, NodeKind};
use ets_types::{ScaledPoint, parse_distance};
use mlua::{MultiValue, Table, Value};

/// Positional arguments of one native function call, with the function
/// name for error messages. Positions are one based, as in Lua.
pub(crate) struct Args {
    function: &'static str,
    values: Vec<Value>,
}

impl Args {
    pub fn new(function: &'static str, values: MultiValue) -> Self {
        Self {
            function,
            values: values.into_iter().collect(),
        }
    }

    /// Like [`Args::new`], dropping a leading `self` of type `T`.
    pub fn for_method<T: Handle>(function: &'static str, values: MultiValue) -> Self {
        let mut args = Self::new(function, values);
        if matches!(args.values.first(), Some(Value::UserData(ud)) if ud.is::<T>()) {
            args.values.remove(0);
        }
        args
    }

    pub fn get(&self, pos: usize) -> Value {
        self.values.get(pos - 1).cloned().unwrap_or(Value::Nil)
    }

    pub fn bad(&self, pos: usize, expected: &str) -> mlua::Error {
        bad_argument(pos, self.function, expected, &type_label(&self.get(pos)))
    }

    pub fn string(&self, pos: usize) -> mlua::Result<String> {
        text_from(&self.get(pos)).ok_or_else(|| self.bad(pos, "string"))
    }

    pub fn integer(&self, pos: usize) -> mlua::Result<i64> {
        integer_from(&self.get(pos)).ok_or_else(|| self.bad(pos, "integer"))
    }

    pub fn scaled(&self, pos: usize) -> mlua::Result<ScaledPoint> {
        scaled_from(&self.get(pos)).ok_or_else(|| self.bad(pos, "distance"))
    }

    pub fn table(&self, pos: usize) -> mlua::Result<Table> {
        match self.get(pos) {
            Value::Table(t) => Ok(t),
            _ => Err(self.bad(pos, "table")),
        }
    }

    pub fn handle<T: Handle>(&self, pos: usize) -> mlua::Result<T> {
        userdata::<T>(&self.get(pos)).ok_or_else(|| self.bad(pos, T::TYPE_NAME))
    }

    pub fn opt_handle<T: Handle>(&self, pos: usize) -> mlua::Result<Option<T>> {
        match self.get(pos) {
            Value::Nil => Ok(None),
            _ => self.handle(pos).map(Some),
        }
    }

    /// A node handle of one specific kind.
    pub fn node_of(&self, pos: usize, kind: NodeKind) -> mlua::Result<NodeHandle> {
        let node: NodeHandle = self.handle(pos)?;
        if node.kind() != kind {
            return Err(self.bad(pos, &format!("{} node", kind)));
        }
        Ok(node)
    }
}

pub(crate) fn userdata<T: Handle>(value: &Value) -> Option<T> {
    match value {
        Value::UserData(ud) => ud.borrow::<T>().ok().map(|h| T::clone(&h)),
        _ => None,
    }
}

/// The type named in error messages: node handles report their kind,
/// other handles their handle type.
pub(crate) fn type_label(value: &Value) -> String {
    let Value::UserData(ud) = value else {
        return value.type_name().to_string();
    };
    if let Ok(node) = ud.borrow::<NodeHandle>() {
        return format!("{} node", node.kind());
    }
    macro_rules! labels {
        ($($ty:ty),*) => {
            $(if ud.is::<$ty>() {
                return <$ty as Handle>::TYPE_NAME.to_string();
            })*
        };
    }
    labels!(
        DocumentHandle,
        PageHandle,
        FaceHandle,
        FontHandle,
        FamilyHandle,
        ImageFileHandle,
        ImageHandle,
        LangHandle
    );
    value.type_name().to_string()
}

pub(crate) fn text_from(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => s.to_str().ok().map(|s| s.to_string()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn number_from(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(*i as f64),
        Value::Number(n) => Some(*n),
        Value::String(s) => s.to_str().ok()?.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn integer_from(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(i) => Some(*i),
        Value::Number(n) if n.fract() == 0.0 && n.is_finite() => Some(*n as i64),
        Value::String(s) => s.to_str().ok()?.trim().parse().ok(),
        _ => None,
    }
}

/// Numbers are scaled points; strings may also be distance literals.
pub(crate) fn scaled_from(value: &Value) -> Option<ScaledPoint> {
    match value {
        Value::Integer(i) => Some(ScaledPoint(*i)),
        Value::Number(n) if n.is_finite() => Some(ScaledPoint(n.round() as i64)),
        Value::String(s) => parse_distance(&s.to_str().ok()?).ok(),
        _ => None,
    }
}

/// Reads a script value as the shape `kind` asks for. `nil` passes
/// through so that the registry can decide whether the field may be
/// cleared.
pub(crate) fn field_value(value: &Value, kind: FieldKind) -> Option<FieldValue> {
    if value.is_nil() {
        return Some(FieldValue::Nil);
    }
    Some(match kind {
        FieldKind::Int => FieldValue::Int(integer_from(value)?),
        FieldKind::Scaled => FieldValue::Scaled(scaled_from(value)?),
        FieldKind::Bool => match value {
            Value::Boolean(b) => FieldValue::Bool(*b),
            _ => return None,
        },
        FieldKind::Text => FieldValue::Text(text_from(value)?),
        FieldKind::Ratio => FieldValue::Ratio(number_from(value)?),
        FieldKind::Node => FieldValue::Node(userdata::<NodeHandle>(value)?.id),
        FieldKind::Font => FieldValue::Font(userdata::<FontHandle>(value)?.font),
        FieldKind::Image => FieldValue::Image(userdata::<ImageHandle>(value)?.image),
        FieldKind::Lang => FieldValue::Lang(userdata::<LangHandle>(value)?.lang),
    })
}
