//! Role-based access control: effective permissions and capability gates.

pub mod capability;
pub mod enforcer;
pub mod evaluator;

pub use capability::Capability;
pub use enforcer::RbacEnforcer;
pub use evaluator::{AuthorizationEvaluator, PermissionSet, effective_permissions};
