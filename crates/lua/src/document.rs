//! Document handles and the `document` library.

use crate::convert::{Args, text_from, type_label, userdata};
use crate::error::{fail, recover, usage};
use crate::font::{FaceHandle, FamilyHandle, FontHandle};
use crate::image::{ImageFileHandle, ImageHandle};
use crate::language::LangHandle;
use crate::node::NodeHandle;
use crate::page::PageHandle;
use crate::properties::{PropertyTable, resource_handle};
use crate::runtime::{self, State};
use ets_core::{Document, DocumentError, FontSource};
use ets_node::NodeKind;
use ets_types::{DocumentId, parse_distance};
use mlua::{IntoLua, IntoLuaMulti, Lua, MultiValue, Table, Value};
use std::rc::Rc;

#[derive(Clone)]
pub(crate) struct DocumentHandle {
    pub(crate) state: Rc<State>,
    pub(crate) id: DocumentId,
}

resource_handle!(DocumentHandle, "document", document, id);

pub(crate) fn properties() -> PropertyTable<DocumentHandle> {
    PropertyTable::<DocumentHandle>::new()
        .method("createfont", create_font)
        .method("createFont", create_font)
        .method("createimage", create_image)
        .method("createImage", create_image)
        .method("currentpage", current_page)
        .method("currentPage", current_page)
        .method("finish", finish)
        .method("hyphenate", hyphenate)
        .method("loadface", load_face)
        .method("loadFace", load_face)
        .method("loadimagefile", load_image_file)
        .method("loadImageFile", load_image_file)
        .method("loadpattern", load_pattern)
        .method("loadPatternFile", load_pattern)
        .method("newfontfamily", new_font_family)
        .method("newFontFamily", new_font_family)
        .method("newpage", new_page)
        .method("newPage", new_page)
        .method("outputat", output_at)
        .method("outputAt", output_at)
        .getter("defaultlanguage", default_language)
        .setter("defaultlanguage", set_default_language)
        .getter("defaultLanguage", default_language)
        .setter("defaultLanguage", set_default_language)
        .getter("filename", |lua, this| {
            let doc = this.state.document(this.id)?;
            if doc.is_finished() {
                return Err(usage(DocumentError::Finished));
            }
            doc.filename().display().to_string().into_lua(lua)
        })
}

/// Reads a `{name = ..., source = ...}` face description.
pub(crate) fn font_source(table: &Table) -> Result<FontSource, String> {
    let field = |key: &str| match table.get::<Value>(key) {
        Ok(value @ Value::String(_)) => text_from(&value).ok_or_else(|| format!("the value of {} is not valid UTF-8", key)),
        _ => Err(format!("the value of {} must be a string", key)),
    };
    Ok(FontSource {
        name: field("name")?,
        source: field("source")?,
    })
}

fn load_face(lua: &Lua, this: &DocumentHandle, args: &Args) -> mlua::Result<MultiValue> {
    let source = match font_source(&args.table(1)?) {
        Ok(source) => source,
        Err(message) => return fail(lua, message),
    };
    let result = this.state.document_mut(this.id)?.load_face(&source);
    recover(
        lua,
        result.map(|face| FaceHandle {
            state: this.state.clone(),
            face,
        }),
    )
}

fn create_font(lua: &Lua, this: &DocumentHandle, args: &Args) -> mlua::Result<MultiValue> {
    let face: FaceHandle = args.handle(1)?;
    let size = args.scaled(2)?;
    let result = this.state.document_mut(this.id)?.create_font(face.face, size);
    recover(
        lua,
        result.map(|font| FontHandle {
            state: this.state.clone(),
            font,
        }),
    )
}

fn create_image(lua: &Lua, this: &DocumentHandle, args: &Args) -> mlua::Result<MultiValue> {
    let file: ImageFileHandle = args.handle(1)?;
    let result = this.state.document_mut(this.id)?.create_image(file.file);
    recover(
        lua,
        result.map(|image| ImageHandle {
            state: this.state.clone(),
            image,
        }),
    )
}

fn current_page(lua: &Lua, this: &DocumentHandle, _: &Args) -> mlua::Result<MultiValue> {
    let result = this.state.document_mut(this.id)?.current_page();
    recover(lua, result.map(|page| PageHandle::new(&this.state, page)))
}

fn new_page(lua: &Lua, this: &DocumentHandle, _: &Args) -> mlua::Result<MultiValue> {
    let result = this.state.document_mut(this.id)?.new_page();
    recover(lua, result.map(|page| PageHandle::new(&this.state, page)))
}

fn finish(lua: &Lua, this: &DocumentHandle, _: &Args) -> mlua::Result<MultiValue> {
    let arena = this.state.arena.borrow();
    let result = this.state.document_mut(this.id)?.finish(&arena);
    recover(lua, result.map(|()| true))
}

/// Returns the number of hyphenation points inserted.
fn hyphenate(lua: &Lua, this: &DocumentHandle, args: &Args) -> mlua::Result<MultiValue> {
    let head: NodeHandle = args.handle(1)?;
    let mut arena = this.state.arena.borrow_mut();
    let result = this.state.document(this.id)?.hyphenate(&mut arena, head.id);
    recover(lua, result)
}

fn load_image_file(lua: &Lua, this: &DocumentHandle, args: &Args) -> mlua::Result<MultiValue> {
    let path = args.string(1)?;
    let result = this.state.document_mut(this.id)?.load_image_file(&path);
    recover(
        lua,
        result.map(|file| ImageFileHandle {
            state: this.state.clone(),
            file,
        }),
    )
}

fn load_pattern(lua: &Lua, this: &DocumentHandle, args: &Args) -> mlua::Result<MultiValue> {
    let path = args.string(1)?;
    let result = this.state.document_mut(this.id)?.load_pattern(&path);
    recover(
        lua,
        result.map(|lang| LangHandle {
            state: this.state.clone(),
            lang,
        }),
    )
}

fn new_font_family(lua: &Lua, this: &DocumentHandle, args: &Args) -> mlua::Result<MultiValue> {
    let name = args.string(1)?;
    let result = this.state.document_mut(this.id)?.new_font_family(&name);
    recover(
        lua,
        result.map(|family| FamilyHandle {
            state: this.state.clone(),
            family,
        }),
    )
}

/// `doc.outputat(x, y, vlist)`: places a vlist on the current page.
fn output_at(lua: &Lua, this: &DocumentHandle, args: &Args) -> mlua::Result<MultiValue> {
    let x = args.scaled(1)?;
    let y = args.scaled(2)?;
    let vlist = args.node_of(3, NodeKind::VList)?;
    let arena = this.state.arena.borrow();
    let result = this.state.document_mut(this.id)?.output_at(&arena, x, y, vlist.id);
    recover(lua, result.map(|()| true))
}

fn default_language(lua: &Lua, this: &DocumentHandle) -> mlua::Result<Value> {
    let lang = this.state.document(this.id)?.default_language().map_err(usage)?;
    match lang {
        Some(lang) => LangHandle {
            state: this.state.clone(),
            lang,
        }
        .into_lua(lua),
        None => Ok(Value::Nil),
    }
}

fn set_default_language(_: &Lua, this: &DocumentHandle, value: Value) -> mlua::Result<()> {
    let lang = userdata::<LangHandle>(&value)
        .ok_or_else(|| usage(format!("defaultlanguage expects a language, got {}", type_label(&value))))?;
    this.state
        .document_mut(this.id)?
        .set_default_language(lang.lang)
        .map_err(usage)
}

pub(crate) fn library(lua: &Lua, state: &Rc<State>) -> mlua::Result<Table> {
    runtime::library(lua, state, &[("new", new), ("sp", sp), ("info", info)])
}

/// `document.new(path)`: creates the output file and returns the document.
fn new(lua: &Lua, state: &Rc<State>, args: &Args) -> mlua::Result<MultiValue> {
    let path = args.string(1)?;
    let id = DocumentId(state.documents.borrow().len() as u32);
    match Document::create(id, &path, state.config.clone()) {
        Ok(doc) => {
            state.documents.borrow_mut().push(doc);
            DocumentHandle {
                state: state.clone(),
                id,
            }
            .into_lua_multi(lua)
        }
        Err(err) => fail(lua, err),
    }
}

/// `document.sp(text)`: converts a distance literal to scaled points.
fn sp(lua: &Lua, _: &Rc<State>, args: &Args) -> mlua::Result<MultiValue> {
    let text = args.string(1)?;
    match parse_distance(&text) {
        Ok(sp) => sp.raw().into_lua_multi(lua),
        Err(err) => fail(lua, err),
    }
}

fn info(lua: &Lua, _: &Rc<State>, args: &Args) -> mlua::Result<MultiValue> {
    let text = args.string(1)?;
    log::info!("{}", text);
    ().into_lua_multi(lua)
}
