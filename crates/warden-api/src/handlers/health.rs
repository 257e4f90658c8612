//! Health check handler.

/// GET /
pub async fn root() -> &'static str {
    "RBAC Backend is running!"
}
