pub mod distance;
pub mod ids;
pub mod scaled;

pub use distance::{DistanceError, parse_distance};
pub use ids::{DocumentId, FaceRef, FamilyRef, FontRef, ImageFileRef, ImageRef, LangRef, PageRef};
pub use scaled::ScaledPoint;
