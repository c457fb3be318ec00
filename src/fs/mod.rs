pub mod locking;
pub mod state_store;
pub mod work_dir;

pub use locking::StateLock;
pub use state_store::StateStore;
pub use work_dir::WorkDir;
