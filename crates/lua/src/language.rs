use crate::convert::{integer_from, text_from, type_label};
use crate::error::usage;
use crate::properties::{PropertyTable, resource_handle};
use crate::runtime::State;
use ets_layout::Lang;
use ets_types::LangRef;
use mlua::{IntoLua, Value};
use std::rc::Rc;

#[derive(Clone)]
pub(crate) struct LangHandle {
    pub(crate) state: Rc<State>,
    pub(crate) lang: LangRef,
}

resource_handle!(LangHandle, "language", lang, lang);

impl LangHandle {
    fn with_lang<R>(&self, f: impl FnOnce(&Lang) -> R) -> mlua::Result<R> {
        let doc = self.state.document(self.lang.document)?;
        let lang = doc.resources().lang(self.lang).map_err(usage)?;
        Ok(f(lang))
    }

    fn with_lang_mut<R>(&self, f: impl FnOnce(&mut Lang) -> R) -> mlua::Result<R> {
        let mut doc = self.state.document_mut(self.lang.document)?;
        let lang = doc.lang_mut(self.lang).map_err(usage)?;
        Ok(f(lang))
    }
}

fn hyphenmin(field: &str, value: &Value) -> mlua::Result<usize> {
    integer_from(value)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| usage(format!("{} expects a non-negative integer, got {}", field, type_label(value))))
}

pub(crate) fn properties() -> PropertyTable<LangHandle> {
    PropertyTable::<LangHandle>::new()
        .getter("name", |lua, this| this.with_lang(|l| l.name.clone())?.into_lua(lua))
        .setter("name", |_, this, value| {
            let name = text_from(&value)
                .ok_or_else(|| usage(format!("name expects a string, got {}", type_label(&value))))?;
            this.with_lang_mut(|l| l.name = name)
        })
        .getter("lefthyphenmin", |lua, this| this.with_lang(|l| l.left_hyphenmin)?.into_lua(lua))
        .setter("lefthyphenmin", |_, this, value| {
            let n = hyphenmin("lefthyphenmin", &value)?;
            this.with_lang_mut(|l| l.left_hyphenmin = n)
        })
        .getter("righthyphenmin", |lua, this| this.with_lang(|l| l.right_hyphenmin)?.into_lua(lua))
        .setter("righthyphenmin", |_, this, value| {
            let n = hyphenmin("righthyphenmin", &value)?;
            this.with_lang_mut(|l| l.right_hyphenmin = n)
        })
}

#[cfg(test)]
mod tests {
    use crate::Runtime;
    use ets_core::EtsConfig;

    #[test]
    fn test_language_fields_are_writable() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = dir.path().join("de.pat");
        std::fs::write(&pattern, "1ta\n").unwrap();
        let rt = Runtime::new(EtsConfig::default()).unwrap();
        let globals = rt.lua().globals();
        globals.set("pattern", pattern.display().to_string()).unwrap();
        globals.set("path", dir.path().join("lang.pdf").display().to_string()).unwrap();
        let (name, left, right, node_name): (String, i64, i64, String) = rt
            .eval(
                r#"
                local doc = document.new(path)
                local lang = doc.loadpattern(pattern)
                assert(lang.name == "de" and lang.lefthyphenmin == 2 and lang.righthyphenmin == 3)
                lang.name = "german"
                lang.lefthyphenmin = 1
                lang.righthyphenmin = "4"
                local n = node.new("lang")
                n.lang = lang
                return lang.name, lang.lefthyphenmin, lang.righthyphenmin, n.name
                "#,
            )
            .unwrap();
        assert_eq!(name, "german");
        assert_eq!(left, 1);
        assert_eq!(right, 4);
        assert_eq!(node_name, "german");
    }

    #[test]
    fn test_language_is_frozen_after_finish() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = dir.path().join("de.pat");
        std::fs::write(&pattern, "1ta\n").unwrap();
        let rt = Runtime::new(EtsConfig::default()).unwrap();
        let globals = rt.lua().globals();
        globals.set("pattern", pattern.display().to_string()).unwrap();
        globals.set("path", dir.path().join("frozen.pdf").display().to_string()).unwrap();
        let (ok, err, name): (bool, String, String) = rt
            .eval(
                r#"
                local doc = document.new(path)
                local lang = doc.loadpattern(pattern)
                assert(doc.finish())
                local ok, err = pcall(function() lang.name = "renamed" end)
                return ok, tostring(err), lang.name
                "#,
            )
            .unwrap();
        assert!(!ok);
        assert!(err.contains("document is already finished"), "{err}");
        assert_eq!(name, "de");
    }

    #[test]
    fn test_lang_node_name_is_read_only() {
        let rt = Runtime::new(EtsConfig::default()).unwrap();
        let err = rt
            .exec(r#"node.new("lang").name = "en""#, "langname")
            .unwrap_err()
            .to_string();
        assert!(err.contains("field 'name' of lang nodes is read-only"), "{err}");
    }
}
