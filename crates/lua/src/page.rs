use crate::convert::Args;
use crate::error::{recover, usage};
use crate::properties::{PropertyTable, resource_handle};
use crate::runtime::State;
use ets_types::PageRef;
use mlua::{IntoLua, Lua, MultiValue, Value};
use std::rc::Rc;

#[derive(Clone)]
pub(crate) struct PageHandle {
    pub(crate) state: Rc<State>,
    pub(crate) page: PageRef,
}

resource_handle!(PageHandle, "page", page, page);

impl PageHandle {
    pub fn new(state: &Rc<State>, page: PageRef) -> Self {
        Self {
            state: state.clone(),
            page,
        }
    }

    fn with_page<R>(&self, f: impl FnOnce(&ets_core::Page) -> R) -> mlua::Result<R> {
        let doc = self.state.document(self.page.document)?;
        let page = doc.page(self.page).map_err(usage)?;
        Ok(f(page))
    }
}

pub(crate) fn properties() -> PropertyTable<PageHandle> {
    PropertyTable::<PageHandle>::new()
        .method("shipout", shipout)
        .getter("width", |lua, this| this.with_page(|p| p.width.raw())?.into_lua(lua))
        .getter("height", |lua, this| this.with_page(|p| p.height.raw())?.into_lua(lua))
        .getter("number", |lua, this| this.with_page(|p| p.number)?.into_lua(lua))
        .getter("shipped", |lua, this| this.with_page(|p| p.is_shipped())?.into_lua(lua))
}

/// Renders the page into the document's output. A page ships out once.
fn shipout(lua: &Lua, this: &PageHandle, _: &Args) -> mlua::Result<MultiValue> {
    let arena = this.state.arena.borrow();
    let result = this.state.document_mut(this.page.document)?.shipout(&arena, this.page);
    recover(lua, result.map(|()| true))
}

#[cfg(test)]
mod tests {
    use crate::Runtime;
    use ets_core::EtsConfig;

    #[test]
    fn test_page_ships_out_once() {
        let dir = tempfile::tempdir().unwrap();
        let rt = Runtime::new(EtsConfig::default()).unwrap();
        let path = dir.path().join("page.pdf");
        rt.lua().globals().set("path", path.display().to_string()).unwrap();
        let (first, second, msg, number, width): (bool, bool, String, i64, i64) = rt
            .eval(
                r#"
                local doc = document.new(path)
                local page = doc.currentpage()
                local ok = page.shipout()
                local again, msg = page:shipout()
                doc.finish()
                return ok, again, msg, page.number, page.width
                "#,
            )
            .unwrap();
        assert!(first);
        assert!(!second);
        assert_eq!(msg, "page 1 was already shipped out");
        assert_eq!(number, 1);
        assert_eq!(width, EtsConfig::default().page_width.raw());
    }

    #[test]
    fn test_current_page_after_shipout_is_new() {
        let dir = tempfile::tempdir().unwrap();
        let rt = Runtime::new(EtsConfig::default()).unwrap();
        let path = dir.path().join("pages.pdf");
        rt.lua().globals().set("path", path.display().to_string()).unwrap();
        let (same, next): (bool, i64) = rt
            .eval(
                r#"
                local doc = document.new(path)
                local a = doc.currentpage()
                local b = doc.currentpage()
                a.shipout()
                local c = doc.currentpage()
                doc.finish()
                return a == b, c.number
                "#,
            )
            .unwrap();
        assert!(same);
        assert_eq!(next, 2);
        let pdf = lopdf::Document::load(&path).unwrap();
        assert_eq!(pdf.get_pages().len(), 2);
    }
}
