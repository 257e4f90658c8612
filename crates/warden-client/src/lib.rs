//! # warden-client
//!
//! Console side of Warden. [`ApiClient`] talks to the `/api` surface and
//! serves as the session's authenticator and role directory; [`Console`]
//! ties the session, the personal hide store, and the menu projection
//! together.

pub mod api;
pub mod console;

pub use api::ApiClient;
pub use console::Console;
