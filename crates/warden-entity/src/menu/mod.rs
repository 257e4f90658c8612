//! Navigation menu value objects.

pub mod hide;
pub mod node;

pub use hide::LocalHideSet;
pub use node::MenuNode;
