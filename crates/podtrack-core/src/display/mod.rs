//! Display wrappers for tracker state.
//!
//! Everything here formats as markdown, rendered by the CLI's terminal
//! renderer or printed as plain text.
//!
//! - [`progression`]: the step list with the current step highlighted
//! - [`documents`]: documents grouped under their step labels
//! - [`status`]: success/failure notices
//! - [`datetime`]: timestamp formatting
//!
//! ```rust
//! use podtrack_core::{display::ProgressionView, models::{PodKey, StepCatalog}};
//!
//! let key = PodKey::new("T-100", "C-7");
//! let catalog = StepCatalog::standard();
//! let output = ProgressionView::new(&key, &catalog, 2).to_string();
//! assert!(output.contains("➤ POD Received"));
//! assert!(output.contains("✓ Complete"));
//! ```

pub mod datetime;
pub mod documents;
pub mod progression;
pub mod status;

pub use datetime::LocalDateTime;
pub use documents::DocumentGroupsView;
pub use progression::{CatalogView, ProgressionView};
pub use status::OperationStatus;
