//! Console session: state machine, manager, and collaborator contracts.

pub mod directory;
pub mod manager;
pub mod memory;
pub mod state;

pub use directory::{Authenticator, RoleDirectory, SignIn};
pub use manager::SessionManager;
pub use memory::InMemoryDirectory;
pub use state::{SessionSnapshot, SessionState};
