//! Navigation menu: static definition, visibility resolution, personal hides.

pub mod catalog;
pub mod local_hide;
pub mod projector;
pub mod resolver;

pub use catalog::system_menu;
pub use local_hide::{FileHideStorage, HideStorage, LocalHideStore, MemoryHideStorage};
pub use projector::MenuProjector;
pub use resolver::{MenuVisibilityResolver, resolve_visible_menu};
