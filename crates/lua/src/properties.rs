//! Name based dispatch for resource handles.

use crate::convert::Args;
use mlua::{Lua, MultiValue, UserData, Value};
use std::collections::BTreeMap;

/// A userdata type the script can receive as an argument.
pub(crate) trait Handle: UserData + Clone + 'static {
    /// Used in `bad argument` messages.
    const TYPE_NAME: &'static str;
}

pub(crate) type Getter<T> = fn(&Lua, &T) -> mlua::Result<Value>;
pub(crate) type Setter<T> = fn(&Lua, &T, Value) -> mlua::Result<()>;
pub(crate) type Method<T> = fn(&Lua, &T, &Args) -> mlua::Result<MultiValue>;

/// The readable and writable names of one handle type.
///
/// Reading a name the table does not know yields `nil`. Writing one is an
/// error, and so is writing a name that only has a getter or is a method.
pub(crate) struct PropertyTable<T> {
    type_name: &'static str,
    getters: BTreeMap<&'static str, Getter<T>>,
    setters: BTreeMap<&'static str, Setter<T>>,
    methods: BTreeMap<&'static str, Method<T>>,
}

impl<T: Handle> PropertyTable<T> {
    pub fn new() -> Self {
        Self {
            type_name: T::TYPE_NAME,
            getters: BTreeMap::new(),
            setters: BTreeMap::new(),
            methods: BTreeMap::new(),
        }
    }

    pub fn method(mut self, name: &'static str, method: Method<T>) -> Self {
        self.methods.insert(name, method);
        self
    }

    pub fn getter(mut self, name: &'static str, getter: Getter<T>) -> Self {
        self.getters.insert(name, getter);
        self
    }

    pub fn setter(mut self, name: &'static str, setter: Setter<T>) -> Self {
        self.setters.insert(name, setter);
        self
    }

    pub fn read(&self, lua: &Lua, this: &T, key: &str) -> mlua::Result<Value> {
        if let Some((&name, &method)) = self.methods.get_key_value(key) {
            return bind(lua, this, name, method);
        }
        match self.getters.get(key) {
            Some(getter) => getter(lua, this),
            None => Ok(Value::Nil),
        }
    }

    pub fn write(&self, lua: &Lua, this: &T, key: &str, value: Value) -> mlua::Result<()> {
        match self.setters.get(key) {
            Some(setter) => setter(lua, this, value),
            None if self.getters.contains_key(key) || self.methods.contains_key(key) => Err(mlua::Error::RuntimeError(format!(
                "field '{}' of {} is read-only",
                key, self.type_name
            ))),
            None => Err(mlua::Error::RuntimeError(format!(
                "unknown field '{}' in {}",
                key, self.type_name
            ))),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.getters.keys().chain(self.methods.keys()).copied()
    }
}

/// Wraps `method` as a Lua function bound to `this`.
///
/// The function can be called either as `h.name(...)` or `h:name(...)`; a
/// leading argument of the handle's own type is dropped.
pub(crate) fn bind<T: Handle>(lua: &Lua, this: &T, name: &'static str, method: Method<T>) -> mlua::Result<Value> {
    let this = this.clone();
    let function = lua.create_function(move |lua, args: MultiValue| {
        let args = Args::for_method::<T>(name, args);
        method(lua, &this, &args)
    })?;
    Ok(Value::Function(function))
}

/// Implements [`Handle`] and the metatable of a resource handle whose
/// property table lives at `State::properties.$table`. Two handles are equal
/// when they wrap the same ref of the same runtime.
macro_rules! resource_handle {
    ($ty:ident, $type_name:literal, $table:ident, $field:ident) => {
        impl $crate::properties::Handle for $ty {
            const TYPE_NAME: &'static str = $type_name;
        }

        impl mlua::UserData for $ty {
            fn add_methods<M: mlua::UserDataMethods<Self>>(methods: &mut M) {
                methods.add_meta_method(mlua::MetaMethod::Index, |lua, this, key: String| {
                    this.state.properties.$table.read(lua, this, &key)
                });
                methods.add_meta_method(
                    mlua::MetaMethod::NewIndex,
                    |lua, this, (key, value): (String, mlua::Value)| {
                        this.state.properties.$table.write(lua, this, &key, value)
                    },
                );
                methods.add_meta_method(mlua::MetaMethod::Eq, |_, this, other: mlua::Value| {
                    Ok(match $crate::convert::userdata::<$ty>(&other) {
                        Some(other) => other.$field == this.$field && std::rc::Rc::ptr_eq(&other.state, &this.state),
                        None => false,
                    })
                });
                methods.add_meta_method(mlua::MetaMethod::ToString, |_, this, ()| {
                    Ok(format!("<{}>", this.$field))
                });
            }
        }
    };
}

pub(crate) use resource_handle;
