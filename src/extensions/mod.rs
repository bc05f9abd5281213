//! Extension namespaces.
//!
//! Each installed bundle owns one directory under `/internal/extensions`,
//! named after the id in its manifest.
//!
//! ```text
//! ExtensionManager
//! ├── store: Arc<dyn VirtualStore>
//! ├── unpacker: Unpacker (size limit)
//! └── namespaces: NamespaceTable
//!     ├── states: id -> Absent | Installing | Present | Removing
//!     └── locks: id -> async mutex (when serialize_namespaces is on)
//! ```
//!
//! Installs are additive: files missing from a newer bundle survive until
//! the namespace is removed.

mod error;
mod manager;
mod state;

pub use error::{InstallError, InstallResult, RemoveError};
pub use manager::{ExtensionManager, InstallReport, RemoveReport, EXTENSIONS_ROOT};
pub use state::NamespaceState;
