pub mod memory;
pub mod model;
pub mod repo;
pub mod store;
pub mod view;

pub use memory::MemoryJobStore;
pub use model::{Job, JobCounts, JobStatus, NewJob, StatusView};
pub use repo::PgJobStore;
pub use store::JobStore;
pub use view::{project, DisplayJob, FieldFormatter, FieldFormatters, FieldKind, PassthroughFormatter};
