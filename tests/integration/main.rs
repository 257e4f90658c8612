//! End-to-end tests over in-memory collaborators.

mod api_test;
mod console_test;
mod helpers;
