pub mod builder;
pub mod canon;
pub mod changes;
pub mod emit;
pub mod error;
pub mod fs;
pub mod load;
pub mod persist;
pub mod relation;
pub mod run;
mod signal;
pub mod snapshot;
pub mod task;
pub mod trace;
pub mod work;

pub use builder::{Builder, Outcome};
pub use emit::Emit;
pub use error::BuildError;
pub use snapshot::{Content, Snapshot};
pub use task::ImportContext;
