//! Capability enforcement against an effective permission set.

use tracing::debug;

use warden_core::error::AppError;

use super::capability::Capability;
use super::evaluator::PermissionSet;

/// Gates operations on the caller's effective permissions.
#[derive(Debug, Clone, Default)]
pub struct RbacEnforcer;

impl RbacEnforcer {
    /// Creates a new enforcer.
    pub fn new() -> Self {
        Self
    }

    /// Returns `Ok(())` if `permissions` grants `capability`, otherwise an
    /// authorization error naming the missing permission.
    pub fn require(&self, permissions: &PermissionSet, capability: Capability) -> Result<(), AppError> {
        if self.allows(permissions, capability) {
            Ok(())
        } else {
            debug!(capability = ?capability, "Capability denied");
            Err(AppError::forbidden(format!(
                "Missing permission '{}'",
                capability.permission_name()
            )))
        }
    }

    /// Whether `permissions` grants `capability`.
    pub fn allows(&self, permissions: &PermissionSet, capability: Capability) -> bool {
        permissions.has(capability.permission_name())
    }
}
