//! Face, font and font family handles.

use crate::convert::Args;
use crate::document::font_source;
use crate::error::{fail, recover, usage};
use crate::properties::{PropertyTable, resource_handle};
use crate::runtime::State;
use ets_core::FontStyle;
use ets_layout::{Face, Font};
use ets_types::{FaceRef, FamilyRef, FontRef};
use mlua::{IntoLua, IntoLuaMulti, Lua, MultiValue, Value};
use std::rc::Rc;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct FaceHandle {
    pub(crate) state: Rc<State>,
    pub(crate) face: FaceRef,
}

resource_handle!(FaceHandle, "face", face, face);

impl FaceHandle {
    fn with_face<R>(&self, f: impl FnOnce(&Arc<Face>) -> R) -> mlua::Result<R> {
        let doc = self.state.document(self.face.document)?;
        let face = doc.resources().face(self.face).map_err(usage)?;
        Ok(f(face))
    }
}

pub(crate) fn face_properties() -> PropertyTable<FaceHandle> {
    PropertyTable::<FaceHandle>::new()
        .getter("name", |lua, this| this.with_face(|f| f.name.clone())?.into_lua(lua))
        .getter("filename", |lua, this| {
            this.with_face(|f| f.filename.as_ref().map(|p| p.display().to_string()))?
                .into_lua(lua)
        })
        .getter("postscriptname", |lua, this| {
            this.with_face(|f| f.postscript_name.clone())?.into_lua(lua)
        })
        .getter("unitsperem", |lua, this| this.with_face(|f| f.units_per_em)?.into_lua(lua))
}

#[derive(Clone)]
pub(crate) struct FontHandle {
    pub(crate) state: Rc<State>,
    pub(crate) font: FontRef,
}

resource_handle!(FontHandle, "font", font, font);

impl FontHandle {
    fn with_font<R>(&self, f: impl FnOnce(&Font) -> R) -> mlua::Result<R> {
        let doc = self.state.document(self.font.document)?;
        let font = doc.resources().font(self.font).map_err(usage)?;
        Ok(f(font))
    }
}

pub(crate) fn font_properties() -> PropertyTable<FontHandle> {
    PropertyTable::<FontHandle>::new()
        .getter("size", |lua, this| this.with_font(|f| f.size.raw())?.into_lua(lua))
        .getter("space", |lua, this| this.with_font(|f| f.space.raw())?.into_lua(lua))
        .getter("stretch", |lua, this| this.with_font(|f| f.stretch.raw())?.into_lua(lua))
        .getter("shrink", |lua, this| this.with_font(|f| f.shrink.raw())?.into_lua(lua))
        .getter("face", |lua, this| {
            let face = this.state.document(this.font.document)?.resources().font_face(this.font);
            FaceHandle {
                state: this.state.clone(),
                face: face.map_err(usage)?,
            }
            .into_lua(lua)
        })
        .method("shape", shape)
}

/// `font.shape(text)`: one record per output glyph, in visual order.
fn shape(lua: &Lua, this: &FontHandle, args: &Args) -> mlua::Result<MultiValue> {
    let text = args.string(1)?;
    let glyphs = this.with_font(|f| f.shape(&text))?;
    let list = lua.create_table_with_capacity(glyphs.len(), 0)?;
    for glyph in glyphs {
        let record = lua.create_table_with_capacity(0, 9)?;
        record.set("codepoint", glyph.codepoint)?;
        record.set("advance", glyph.advance.raw())?;
        record.set("components", glyph.components)?;
        record.set("glyph", glyph.glyph)?;
        record.set("hyphenate", glyph.hyphenate)?;
        record.set("isspace", glyph.is_space)?;
        record.set("font", this.clone())?;
        record.set("height", glyph.height.raw())?;
        record.set("depth", glyph.depth.raw())?;
        list.push(record)?;
    }
    list.into_lua_multi(lua)
}

#[derive(Clone)]
pub(crate) struct FamilyHandle {
    pub(crate) state: Rc<State>,
    pub(crate) family: FamilyRef,
}

resource_handle!(FamilyHandle, "fontfamily", family, family);

pub(crate) fn family_properties() -> PropertyTable<FamilyHandle> {
    PropertyTable::<FamilyHandle>::new()
        .getter("id", |lua, this| {
            let doc = this.state.document(this.family.document)?;
            doc.resources().family(this.family).map_err(usage)?.id.into_lua(lua)
        })
        .getter("name", |lua, this| {
            let doc = this.state.document(this.family.document)?;
            doc.resources().family(this.family).map_err(usage)?.name.clone().into_lua(lua)
        })
        .method("addmember", add_member)
        .method("member", member)
}

fn weight_and_style(args: &Args, weight: usize, style: usize) -> mlua::Result<(u16, FontStyle)> {
    let w = u16::try_from(args.integer(weight)?).map_err(|_| args.bad(weight, "font weight"))?;
    let s = FontStyle::from_name(&args.string(style)?).ok_or_else(|| args.bad(style, "regular, normal or italic"))?;
    Ok((w, s))
}

/// `family.addmember({name = ..., source = ...}, weight, style)`
fn add_member(lua: &Lua, this: &FamilyHandle, args: &Args) -> mlua::Result<MultiValue> {
    let spec = args.table(1)?;
    let (weight, style) = weight_and_style(args, 2, 3)?;
    let source = match font_source(&spec) {
        Ok(source) => source,
        Err(message) => return fail(lua, message),
    };
    let result = this
        .state
        .document_mut(this.family.document)?
        .add_family_member(this.family, &source, weight, style);
    recover(
        lua,
        result.map(|face| FaceHandle {
            state: this.state.clone(),
            face,
        }),
    )
}

fn member(lua: &Lua, this: &FamilyHandle, args: &Args) -> mlua::Result<MultiValue> {
    let (weight, style) = weight_and_style(args, 1, 2)?;
    let doc = this.state.document(this.family.document)?;
    let face = doc.resources().family(this.family).map_err(usage)?.member(weight, style);
    match face {
        Some(face) => FaceHandle {
            state: this.state.clone(),
            face,
        }
        .into_lua_multi(lua),
        None => Value::Nil.into_lua_multi(lua),
    }
}

#[cfg(test)]
mod tests {
    use crate::Runtime;
    use ets_core::EtsConfig;

    /// Path of any installed TrueType font, or `None` on bare machines.
    fn font_file() -> Option<String> {
        #[cfg(feature = "system-fonts")]
        {
            ets_layout::FontLocator::system()
                .fallback()
                .and_then(|face| face.filename)
                .map(|p| p.display().to_string())
        }
        #[cfg(not(feature = "system-fonts"))]
        {
            None
        }
    }

    fn runtime(dir: &tempfile::TempDir) -> Runtime {
        let _ = env_logger::builder().is_test(true).try_init();
        let rt = Runtime::new(EtsConfig::default()).unwrap();
        let path = dir.path().join("font.pdf");
        rt.lua().globals().set("path", path.display().to_string()).unwrap();
        rt
    }

    #[test]
    fn test_shaping_is_deterministic() {
        let Some(file) = font_file() else {
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let rt = runtime(&dir);
        rt.lua().globals().set("fontfile", file).unwrap();
        let (same, count, advance, samefont): (bool, i64, i64, bool) = rt
            .eval(
                r#"
                local doc = document.new(path)
                local face = doc.loadface({name = "body", source = fontfile})
                local font = doc.createfont(face, "10pt")
                local a = font.shape("Hello")
                local b = font:shape("Hello")
                local same = #a == #b
                for i = 1, #a do
                    same = same and a[i].codepoint == b[i].codepoint and a[i].advance == b[i].advance
                end
                doc.finish()
                return same, #a, a[1].advance, a[1].font == font
                "#,
            )
            .unwrap();
        assert!(same);
        assert!(count > 0);
        assert!(advance > 0);
        assert!(samefont);
    }

    #[test]
    fn test_fonts_are_cached_per_face_and_size() {
        let Some(file) = font_file() else {
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let rt = runtime(&dir);
        rt.lua().globals().set("fontfile", file).unwrap();
        let (same, size, upem): (bool, i64, i64) = rt
            .eval(
                r#"
                local doc = document.new(path)
                local face = doc.loadface({name = "body", source = fontfile})
                local a = doc.createfont(face, "12pt")
                local b = doc.createFont(face, 12 * 65536)
                doc.finish()
                return a == b, a.size, a.face.unitsperem
                "#,
            )
            .unwrap();
        assert!(same);
        assert_eq!(size, 12 * 65536);
        assert!(upem > 0);
    }

    #[test]
    fn test_family_members() {
        let Some(file) = font_file() else {
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let rt = runtime(&dir);
        rt.lua().globals().set("fontfile", file).unwrap();
        let (id, name, found, missing): (i64, String, bool, bool) = rt
            .eval(
                r#"
                local doc = document.new(path)
                local fam = doc.newfontfamily("text")
                local face = fam.addmember({name = "text-regular", source = fontfile}, 400, "regular")
                local hit = fam.member(400, "normal")
                local miss = fam.member(700, "italic")
                doc.finish()
                return fam.id, fam.name, hit == face, miss == nil
                "#,
            )
            .unwrap();
        assert_eq!(id, 0);
        assert_eq!(name, "text");
        assert!(found);
        assert!(missing);
    }

    #[test]
    fn test_bad_style_is_raised() {
        let dir = tempfile::tempdir().unwrap();
        let rt = runtime(&dir);
        let err = rt
            .exec(
                r#"
                local doc = document.new(path)
                local fam = doc.newfontfamily("text")
                fam.addmember({name = "x", source = "x.ttf"}, 400, "oblique")
                "#,
                "style",
            )
            .unwrap_err()
            .to_string();
        assert!(
            err.contains("bad argument #3 to 'addmember' (regular, normal or italic expected, got string)"),
            "{err}"
        );
    }
}
