//! Permission catalog: flat persisted rows and the runtime tree built from them.

pub mod model;
pub mod tree;

pub use model::{CreatePermission, Permission};
pub use tree::{PermissionNode, PermissionTree};
