use crate::error::usage;
use crate::properties::{PropertyTable, resource_handle};
use crate::runtime::State;
use ets_core::{Image, ImageFile};
use ets_types::{ImageFileRef, ImageRef};
use mlua::IntoLua;
use std::rc::Rc;

#[derive(Clone)]
pub(crate) struct ImageFileHandle {
    pub(crate) state: Rc<State>,
    pub(crate) file: ImageFileRef,
}

resource_handle!(ImageFileHandle, "imagefile", image_file, file);

impl ImageFileHandle {
    fn with_file<R>(&self, f: impl FnOnce(&ImageFile) -> R) -> mlua::Result<R> {
        let doc = self.state.document(self.file.document)?;
        let file = doc.resources().image_file(self.file).map_err(usage)?;
        Ok(f(file))
    }
}

/// Width and height are in pixels.
pub(crate) fn image_file_properties() -> PropertyTable<ImageFileHandle> {
    PropertyTable::<ImageFileHandle>::new()
        .getter("format", |lua, this| this.with_file(|f| f.format_name())?.into_lua(lua))
        .getter("numberOfPages", |lua, this| this.with_file(|f| f.number_of_pages)?.into_lua(lua))
        .getter("filename", |lua, this| {
            this.with_file(|f| f.filename.display().to_string())?.into_lua(lua)
        })
        .getter("width", |lua, this| this.with_file(|f| f.width)?.into_lua(lua))
        .getter("height", |lua, this| this.with_file(|f| f.height)?.into_lua(lua))
}

#[derive(Clone)]
pub(crate) struct ImageHandle {
    pub(crate) state: Rc<State>,
    pub(crate) image: ImageRef,
}

resource_handle!(ImageHandle, "image", image, image);

impl ImageHandle {
    fn with_image<R>(&self, f: impl FnOnce(&Image) -> R) -> mlua::Result<R> {
        let doc = self.state.document(self.image.document)?;
        let image = doc.resources().image(self.image).map_err(usage)?;
        Ok(f(image))
    }
}

/// Width and height are scaled points.
pub(crate) fn image_properties() -> PropertyTable<ImageHandle> {
    PropertyTable::<ImageHandle>::new()
        .getter("width", |lua, this| this.with_image(|i| i.width.raw())?.into_lua(lua))
        .getter("height", |lua, this| this.with_image(|i| i.height.raw())?.into_lua(lua))
        .getter("imagefile", |lua, this| {
            ImageFileHandle {
                state: this.state.clone(),
                file: this.with_image(|i| i.file)?,
            }
            .into_lua(lua)
        })
}
