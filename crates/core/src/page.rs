use ets_render_lopdf::Placement;
use ets_types::ScaledPoint;

/// A page under construction. Vertical lists placed on it are rendered
/// when it is shipped out.
#[derive(Debug, Clone)]
pub struct Page {
    /// One based position in the document.
    pub number: usize,
    pub width: ScaledPoint,
    pub height: ScaledPoint,
    pub(crate) placements: Vec<Placement>,
    pub(crate) shipped: bool,
}

impl Page {
    pub(crate) fn new(number: usize, width: ScaledPoint, height: ScaledPoint) -> Self {
        Self {
            number,
            width,
            height,
            placements: Vec::new(),
            shipped: false,
        }
    }

    pub fn is_shipped(&self) -> bool {
        self.shipped
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }
}
