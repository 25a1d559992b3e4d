//! Node handles and the `node` library.

use crate::convert::{Args, field_value, scaled_from, text_from, type_label};
use crate::error::{fail, usage};
use crate::font::FontHandle;
use crate::image::ImageHandle;
use crate::language::LangHandle;
use crate::properties::Handle;
use crate::runtime::{self, State};
use ets_layout::{LinebreakSettings, hpack, hpack_to, simple_linebreak};
use ets_node::{FieldValue, LangNode, NodeError, NodeId, NodeKind};
use mlua::{IntoLuaMulti, Lua, MetaMethod, MultiValue, Table, UserData, UserDataMethods, Value};
use std::rc::Rc;

#[derive(Clone)]
pub(crate) struct NodeHandle {
    pub(crate) state: Rc<State>,
    pub(crate) id: NodeId,
}

impl NodeHandle {
    pub fn new(state: &Rc<State>, id: NodeId) -> Self {
        Self { state: state.clone(), id }
    }

    pub fn kind(&self) -> NodeKind {
        self.state.arena.borrow().kind(self.id)
    }

    fn index(&self, lua: &Lua, key: &str) -> mlua::Result<Value> {
        if key == "name" && self.kind() == NodeKind::Lang {
            return self.lang_name(lua);
        }
        let value = self.state.registry.get(&self.state.arena.borrow(), self.id, key);
        field_to_lua(lua, &self.state, value)
    }

    /// Lang nodes report the name of the language they reference.
    fn lang_name(&self, lua: &Lua) -> mlua::Result<Value> {
        let Some(lang) = self.state.arena.borrow().get::<LangNode>(self.id).map_err(usage)?.lang else {
            return Ok(Value::Nil);
        };
        let doc = self.state.document(lang.document)?;
        let name = doc.resources().lang(lang).map_err(usage)?.name.clone();
        Ok(Value::String(lua.create_string(&name)?))
    }

    fn new_index(&self, key: &str, value: Value) -> mlua::Result<()> {
        let kind = self.kind();
        if key == "name" && kind == NodeKind::Lang {
            return Err(usage(NodeError::ReadOnlyField {
                kind,
                field: key.to_string(),
            }));
        }
        let registry = &self.state.registry;
        let field = registry.writable(kind, key).map_err(usage)?;
        let converted = field_value(&value, field.kind).ok_or_else(|| {
            usage(format!(
                "field '{}' of {} nodes expects {}, got {}",
                key,
                kind,
                field.kind,
                type_label(&value)
            ))
        })?;
        registry
            .set(&mut self.state.arena.borrow_mut(), self.id, key, converted)
            .map_err(usage)
    }
}

impl Handle for NodeHandle {
    const TYPE_NAME: &'static str = "node";
}

impl UserData for NodeHandle {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_meta_method(MetaMethod::Index, |lua, this, key: Value| match text_from(&key) {
            Some(key) => this.index(lua, &key),
            None => Ok(Value::Nil),
        });
        methods.add_meta_method(MetaMethod::NewIndex, |_, this, (key, value): (Value, Value)| {
            let key = text_from(&key).ok_or_else(|| usage(format!("invalid field name ({})", key.type_name())))?;
            this.new_index(&key, value)
        });
        methods.add_meta_method(MetaMethod::Eq, |_, this, other: Value| {
            Ok(match crate::convert::userdata::<NodeHandle>(&other) {
                Some(other) => other.id == this.id && Rc::ptr_eq(&other.state, &this.state),
                None => false,
            })
        });
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            Ok(format!("<{} node {}>", this.kind(), this.id))
        });
    }
}

/// Hands a field value to the script. Resource references become handles
/// sharing this runtime's state.
pub(crate) fn field_to_lua(lua: &Lua, state: &Rc<State>, value: FieldValue) -> mlua::Result<Value> {
    Ok(match value {
        FieldValue::Nil => Value::Nil,
        FieldValue::Int(i) => Value::Integer(i),
        FieldValue::Scaled(sp) => Value::Integer(sp.raw()),
        FieldValue::Bool(b) => Value::Boolean(b),
        FieldValue::Text(s) => Value::String(lua.create_string(&s)?),
        FieldValue::Ratio(r) => Value::Number(r),
        FieldValue::Node(id) => Value::UserData(lua.create_userdata(NodeHandle::new(state, id))?),
        FieldValue::Font(font) => Value::UserData(lua.create_userdata(FontHandle {
            state: state.clone(),
            font,
        })?),
        FieldValue::Image(image) => Value::UserData(lua.create_userdata(ImageHandle {
            state: state.clone(),
            image,
        })?),
        FieldValue::Lang(lang) => Value::UserData(lua.create_userdata(LangHandle {
            state: state.clone(),
            lang,
        })?),
    })
}

fn node_value(lua: &Lua, state: &Rc<State>, id: NodeId) -> mlua::Result<MultiValue> {
    NodeHandle::new(state, id).into_lua_multi(lua)
}

pub(crate) fn library(lua: &Lua, state: &Rc<State>) -> mlua::Result<Table> {
    runtime::library(
        lua,
        state,
        &[
            ("new", new_node),
            ("debug", debug),
            ("hpack", pack),
            ("insertafter", insert_after),
            ("insertbefore", insert_before),
            ("remove", remove),
            ("simplelinebreak", linebreak),
        ],
    )
}

fn new_node(lua: &Lua, state: &Rc<State>, args: &Args) -> mlua::Result<MultiValue> {
    let name = args.string(1)?;
    let id = state.arena.borrow_mut().new_node_named(&name).map_err(usage)?;
    log::trace!("node.new {} -> {}", name, id);
    node_value(lua, state, id)
}

fn debug(lua: &Lua, state: &Rc<State>, args: &Args) -> mlua::Result<MultiValue> {
    let head: NodeHandle = args.handle(1)?;
    let dump = state.arena.borrow().dump(head.id);
    log::info!("{}", dump);
    dump.into_lua_multi(lua)
}

/// `node.hpack(head [, width])`: packs the list at `head` into an hlist,
/// at its natural width or set to `width`.
fn pack(lua: &Lua, state: &Rc<State>, args: &Args) -> mlua::Result<MultiValue> {
    let head = args.opt_handle::<NodeHandle>(1)?.map(|h| h.id);
    let width = match args.get(2) {
        Value::Nil => None,
        _ => Some(args.scaled(2)?),
    };
    let mut arena = state.arena.borrow_mut();
    let hlist = match width {
        Some(width) => hpack_to(&mut arena, head, width),
        None => hpack(&mut arena, head),
    };
    drop(arena);
    node_value(lua, state, hlist)
}

fn insert_after(lua: &Lua, state: &Rc<State>, args: &Args) -> mlua::Result<MultiValue> {
    let head = args.opt_handle::<NodeHandle>(1)?.map(|h| h.id);
    let current = args.opt_handle::<NodeHandle>(2)?.map(|h| h.id);
    let insert: NodeHandle = args.handle(3)?;
    let head = state.arena.borrow_mut().insert_after(head, current, insert.id);
    node_value(lua, state, head)
}

fn insert_before(lua: &Lua, state: &Rc<State>, args: &Args) -> mlua::Result<MultiValue> {
    let head = args.opt_handle::<NodeHandle>(1)?.map(|h| h.id);
    let current = args.opt_handle::<NodeHandle>(2)?.map(|h| h.id);
    let insert: NodeHandle = args.handle(3)?;
    let head = state.arena.borrow_mut().insert_before(head, current, insert.id);
    node_value(lua, state, head)
}

/// `node.remove(head, current)`: unlinks `current`, joining its neighbours.
/// Returns the new head and the detached node.
fn remove(lua: &Lua, state: &Rc<State>, args: &Args) -> mlua::Result<MultiValue> {
    let head = args.opt_handle::<NodeHandle>(1)?.map(|h| h.id);
    let current: NodeHandle = args.handle(2)?;
    let mut arena = state.arena.borrow_mut();
    let head = if head == Some(current.id) {
        arena.next(current.id)
    } else {
        head
    };
    arena.detach(current.id);
    drop(arena);
    let head = head.map(|id| NodeHandle::new(state, id));
    (head, current).into_lua_multi(lua)
}

/// `node.simplelinebreak(hlist, {hsize = ..., lineheight = ...})`
fn linebreak(lua: &Lua, state: &Rc<State>, args: &Args) -> mlua::Result<MultiValue> {
    let hlist = args.node_of(1, NodeKind::HList)?;
    let settings = args.table(2)?;
    let hsize: Value = settings.get("hsize")?;
    let lineheight: Value = settings.get("lineheight")?;
    let (Some(hsize), Some(line_height)) = (scaled_from(&hsize), scaled_from(&lineheight)) else {
        return fail(lua, "simplelinebreak: hsize and lineheight must be distances");
    };
    let result = simple_linebreak(
        &mut state.arena.borrow_mut(),
        hlist.id,
        &LinebreakSettings { hsize, line_height },
    );
    match result {
        Ok(vlist) => node_value(lua, state, vlist),
        Err(ets_layout::LayoutError::Node(err)) => Err(usage(err)),
        Err(err) => fail(lua, err),
    }
}

#[cfg(test)]
mod tests {
    use crate::Runtime;
    use ets_core::EtsConfig;

    fn runtime() -> Runtime {
        let _ = env_logger::builder().is_test(true).try_init();
        Runtime::new(EtsConfig::default()).unwrap()
    }

    #[test]
    fn test_fields_round_trip() {
        let rt = runtime();
        let (width, stretch, penalty, flagged): (i64, i64, i64, bool) = rt
            .eval(
                r#"
                local g = node.new("glue")
                g.width = 65536
                g.stretch = "2pt"
                local p = node.new("penalty")
                p.penalty = -50
                p.flagged = true
                return g.width, g.stretch, p.penalty, p.flagged
                "#,
            )
            .unwrap();
        assert_eq!(width, 65536);
        assert_eq!(stretch, 2 * 65536);
        assert_eq!(penalty, -50);
        assert!(flagged);
    }

    #[test]
    fn test_unknown_names_read_as_nil() {
        let rt = runtime();
        let nil: bool = rt.eval(r#"return node.new("disc").nosuchfield == nil"#).unwrap();
        assert!(nil);
    }

    #[test]
    fn test_links_follow_insertion() {
        let rt = runtime();
        let ok: bool = rt
            .eval(
                r#"
                local a = node.new("glyph")
                local b = node.new("glue")
                local c = node.new("penalty")
                local head = node.insertafter(nil, nil, a)
                head = node.insertafter(head, a, c)
                head = node.insertbefore(head, c, b)
                return head == a and a.next == b and b.next == c and c.prev == b
                    and b.prev == a and a.prev == nil and c.next == nil
                "#,
            )
            .unwrap();
        assert!(ok);
    }

    #[test]
    fn test_insert_before_head_returns_new_head() {
        let rt = runtime();
        let ok: bool = rt
            .eval(
                r#"
                local a = node.new("glyph")
                local b = node.new("glyph")
                local head = node.insertbefore(a, a, b)
                return head == b and b.next == a and a.prev == b
                "#,
            )
            .unwrap();
        assert!(ok);
    }

    #[test]
    fn test_glyph_field_on_glue_is_type_mismatch() {
        let rt = runtime();
        let err = rt
            .exec(r#"local g = node.new("glue"); g.codepoint = 65"#, "mismatch")
            .unwrap_err()
            .to_string();
        assert!(err.contains("glyph node expected, got glue node"), "{err}");
    }

    #[test]
    fn test_unknown_field_write_is_an_error() {
        let rt = runtime();
        let err = rt
            .exec(r#"node.new("glue").colour = 1"#, "unknown")
            .unwrap_err()
            .to_string();
        assert!(err.contains("unknown field 'colour' in glue"), "{err}");
    }

    #[test]
    fn test_wrong_value_shape_is_rejected() {
        let rt = runtime();
        let err = rt
            .exec(r#"node.new("penalty").flagged = "yes""#, "shape")
            .unwrap_err()
            .to_string();
        assert!(err.contains("field 'flagged' of penalty nodes expects boolean"), "{err}");
    }

    #[test]
    fn test_unknown_kind_is_raised() {
        let rt = runtime();
        let err = rt.exec(r#"node.new("kern")"#, "kind").unwrap_err().to_string();
        assert!(err.contains("unknown node kind 'kern'"), "{err}");
    }

    #[test]
    fn test_bad_argument_message() {
        let rt = runtime();
        let err = rt
            .exec(r#"node.insertafter(nil, nil, 42)"#, "args")
            .unwrap_err()
            .to_string();
        assert!(
            err.contains("bad argument #3 to 'insertafter' (node expected, got number)")
                || err.contains("bad argument #3 to 'insertafter' (node expected, got integer)"),
            "{err}"
        );
    }

    #[test]
    fn test_linebreak_wants_an_hlist() {
        let rt = runtime();
        let err = rt
            .exec(
                r#"node.simplelinebreak(node.new("vlist"), {hsize = "10pt", lineheight = "12pt"})"#,
                "linebreak",
            )
            .unwrap_err()
            .to_string();
        assert!(err.contains("hlist node expected, got vlist node"), "{err}");
    }

    #[test]
    fn test_hpack_and_linebreak() {
        let rt = runtime();
        let (width, lines): (i64, i64) = rt
            .eval(
                r#"
                local head
                for i = 1, 3 do
                    local g = node.new("glyph")
                    g.width = "10pt"
                    head = node.insertbefore(head, nil, g)
                    if i < 3 then
                        local glue = node.new("glue")
                        glue.width = "2pt"
                        head = node.insertbefore(head, nil, glue)
                    end
                end
                local hl = node.hpack(head)
                local w = hl.width
                local vl = node.simplelinebreak(hl, {hsize = "25pt", lineheight = "12pt"})
                local n = 0
                local line = vl.list
                while line do
                    n = n + 1
                    line = line.next
                end
                return w, n
                "#,
            )
            .unwrap();
        assert_eq!(width, 34 * 65536);
        assert!(lines >= 2);
    }

    #[test]
    fn test_remove_detaches_and_rejoins() {
        let rt = runtime();
        let ok: bool = rt
            .eval(
                r#"
                local a = node.new("glyph")
                local b = node.new("glue")
                local c = node.new("penalty")
                local head = node.insertafter(nil, nil, a)
                head = node.insertafter(head, a, b)
                head = node.insertafter(head, b, c)
                local h1, removed = node.remove(head, b)
                local linked = h1 == a and removed == b and a.next == c and c.prev == a
                local detached = b.next == nil and b.prev == nil
                local h2 = node.remove(h1, a)
                return linked and detached and h2 == c and c.prev == nil and node.remove(c, c) == nil
                "#,
            )
            .unwrap();
        assert!(ok);
    }

    #[test]
    fn test_huge_widths_do_not_overflow() {
        let rt = runtime();
        let (width, excess): (i64, bool) = rt
            .eval(
                r#"
                local a = node.new("glyph")
                local b = node.new("glyph")
                a.width = math.maxinteger
                b.width = math.maxinteger
                local head = node.insertafter(a, a, b)
                local hl = node.hpack(head)
                local set = node.hpack(head, -math.maxinteger)
                return hl.width, set.width < 0
                "#,
            )
            .unwrap();
        assert_eq!(width, i64::MAX);
        assert!(excess);
    }

    #[test]
    fn test_bad_linebreak_settings_fail_softly() {
        let rt = runtime();
        let (ok, msg): (bool, String) = rt
            .eval(r#"return node.simplelinebreak(node.hpack(nil), {hsize = 0, lineheight = "12pt"})"#)
            .unwrap();
        assert!(!ok);
        assert!(msg.contains("hsize"));
    }

    #[test]
    fn test_debug_leaves_list_alone() {
        let rt = runtime();
        let (dump, ok): (String, bool) = rt
            .eval(
                r#"
                local a = node.new("glyph")
                local b = node.new("glue")
                local head = node.insertafter(a, a, b)
                local d = node.debug(head)
                return d, a.next == b and b.prev == a
                "#,
            )
            .unwrap();
        assert!(dump.contains("glyph"));
        assert!(dump.contains("glue"));
        assert!(ok);
    }
}
