//! Navigation menu use cases.

pub mod service;

pub use service::MenuService;
