pub mod csv_export;
pub mod edit_session;
pub mod projector;
pub mod proposal_cache;
pub mod sheet_sync;

pub use csv_export::export_csv;
pub use edit_session::{CellState, EditSession, EditableCell, ValueKind};
pub use projector::{project, project_with_cap, ProjectedRow, ProjectedTable};
pub use proposal_cache::ProposalCache;
pub use sheet_sync::SheetSyncScheduler;
