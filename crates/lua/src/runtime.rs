use crate::convert::Args;
use crate::document::{self, DocumentHandle};
use crate::error::{ScriptError, usage};
use crate::font::{self, FaceHandle, FamilyHandle, FontHandle};
use crate::image::{self, ImageFileHandle, ImageHandle};
use crate::language::{self, LangHandle};
use crate::node;
use crate::page::{self, PageHandle};
use crate::properties::PropertyTable;
use ets_core::{Document, EtsConfig};
use ets_node::{NodeArena, TypeRegistry};
use ets_types::DocumentId;
use mlua::{FromLuaMulti, Function, Lua, MultiValue, Table};
use std::cell::{Ref, RefCell, RefMut};
use std::path::Path;
use std::rc::Rc;

/// Everything the native side of a script shares: the node arena, the
/// documents and the dispatch tables.
pub(crate) struct State {
    pub arena: RefCell<NodeArena>,
    pub registry: TypeRegistry,
    pub documents: RefCell<Vec<Document>>,
    pub config: EtsConfig,
    pub properties: Properties,
}

impl State {
    pub fn document(&self, id: DocumentId) -> mlua::Result<Ref<'_, Document>> {
        Ref::filter_map(self.documents.borrow(), |docs| docs.get(id.0 as usize))
            .map_err(|_| usage(format!("{} does not exist", id)))
    }

    pub fn document_mut(&self, id: DocumentId) -> mlua::Result<RefMut<'_, Document>> {
        RefMut::filter_map(self.documents.borrow_mut(), |docs| docs.get_mut(id.0 as usize))
            .map_err(|_| usage(format!("{} does not exist", id)))
    }
}

/// The property tables of every resource handle type.
pub(crate) struct Properties {
    pub document: PropertyTable<DocumentHandle>,
    pub page: PropertyTable<PageHandle>,
    pub face: PropertyTable<FaceHandle>,
    pub font: PropertyTable<FontHandle>,
    pub family: PropertyTable<FamilyHandle>,
    pub image_file: PropertyTable<ImageFileHandle>,
    pub image: PropertyTable<ImageHandle>,
    pub lang: PropertyTable<LangHandle>,
}

impl Properties {
    fn new() -> Self {
        Self {
            document: document::properties(),
            page: page::properties(),
            face: font::face_properties(),
            font: font::font_properties(),
            family: font::family_properties(),
            image_file: image::image_file_properties(),
            image: image::image_properties(),
            lang: language::properties(),
        }
    }
}

pub(crate) type Global = fn(&Lua, &Rc<State>, &Args) -> mlua::Result<MultiValue>;

/// Builds a global library table from native functions.
pub(crate) fn library(lua: &Lua, state: &Rc<State>, entries: &[(&'static str, Global)]) -> mlua::Result<Table> {
    let table = lua.create_table()?;
    for &(name, function) in entries {
        table.set(name, global(lua, state, name, function)?)?;
    }
    Ok(table)
}

fn global(lua: &Lua, state: &Rc<State>, name: &'static str, function: Global) -> mlua::Result<Function> {
    let state = state.clone();
    lua.create_function(move |lua, args: MultiValue| function(lua, &state, &Args::new(name, args)))
}

/// A Lua interpreter with the `node` and `document` libraries installed.
///
/// All dispatch tables are built here, before the first script runs.
pub struct Runtime {
    lua: Lua,
    state: Rc<State>,
}

impl Runtime {
    pub fn new(config: EtsConfig) -> Result<Self, ScriptError> {
        let lua = Lua::new();
        let state = Rc::new(State {
            arena: RefCell::new(NodeArena::new()),
            registry: TypeRegistry::new(),
            documents: RefCell::new(Vec::new()),
            config,
            properties: Properties::new(),
        });
        lua.globals().set("node", node::library(&lua, &state)?)?;
        lua.globals().set("document", document::library(&lua, &state)?)?;
        log::debug!("Lua runtime ready");
        Ok(Self { lua, state })
    }

    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    pub fn config(&self) -> &EtsConfig {
        &self.state.config
    }

    /// Runs a chunk. `name` shows up in Lua error messages.
    pub fn exec(&self, source: &str, name: &str) -> Result<(), ScriptError> {
        self.lua.load(source).set_name(name).exec()?;
        Ok(())
    }

    /// Evaluates a chunk and converts its results.
    pub fn eval<R: FromLuaMulti>(&self, source: &str) -> Result<R, ScriptError> {
        Ok(self.lua.load(source).eval()?)
    }

    pub fn exec_file(&self, path: impl AsRef<Path>) -> Result<(), ScriptError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.display().to_string(),
            source,
        })?;
        log::debug!("Running {}", path.display());
        self.exec(&source, &format!("@{}", path.display()))
    }

    pub fn document_count(&self) -> usize {
        self.state.documents.borrow().len()
    }

    pub fn node_count(&self) -> usize {
        self.state.arena.borrow().len()
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        for doc in self.state.documents.borrow().iter() {
            if !doc.is_finished() {
                log::warn!("{} was never finished", doc.filename().display());
            }
        }
    }
}
