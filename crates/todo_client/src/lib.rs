//! Todo client: local snapshot or remote API behind one repository.
//!
//! # Responsibility
//! - Emulate browser-style key/value storage on disk.
//! - Auto-detect the data source once and expose a uniform repository.
//! - Derive view state (filters, suggestions, progress) and drive mutations
//!   through `TodoApp`.

pub mod app;
pub mod error;
pub mod local;
pub mod prefs;
pub mod remote;
pub mod repository;
pub mod storage;
pub mod view;

pub use app::TodoApp;
pub use error::{ClientError, ClientResult};
pub use local::LocalTodoRepository;
pub use prefs::{DataSource, Preferences, DEFAULT_API_BASE};
pub use remote::{HealthReport, RemoteTodoRepository};
pub use repository::{detect_data_source, Repository, PROBE_TIMEOUT};
pub use storage::LocalStorage;
pub use view::{partition, suggestions, visible_todos, DashboardStats, Filter};
