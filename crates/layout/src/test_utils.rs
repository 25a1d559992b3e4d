use crate::fonts::Face;
use std::sync::{Arc, OnceLock};

/// A TrueType face from the system, shared across tests. `None` when the
/// machine has no usable fonts; font-dependent tests return early then.
pub fn fallback_face() -> Option<Arc<Face>> {
    static FACE: OnceLock<Option<Arc<Face>>> = OnceLock::new();
    let _ = env_logger::builder().is_test(true).try_init();
    FACE.get_or_init(|| {
        #[cfg(feature = "system-fonts")]
        {
            crate::fonts::FontLocator::system().fallback().map(Arc::new)
        }
        #[cfg(not(feature = "system-fonts"))]
        {
            None
        }
    })
    .clone()
}
