//! State store — in-memory state with a durable, namespaced record.

pub mod persist;
pub mod state;

pub use persist::{FileStorage, MemoryStorage, PersistedState, STORAGE_NAMESPACE, StateStorage};
pub use state::{AppState, AppStore, StoreEvent, TaskCompletion};
