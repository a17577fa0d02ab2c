//! Data models for the POD progression workflow.
//!
//! - [`step`]: the fixed, ordered step catalog and status resolution
//! - [`document`]: evidence documents attached to a step
//! - [`record`]: the server-side record for one trip/client pair
//! - [`upload`]: files on their way to the authority
//!
//! Display implementations live in [`crate::display`].

pub mod document;
pub mod record;
pub mod step;
pub mod upload;


pub use document::Document;
pub use record::{ClientPodRecord, PodKey};
pub use step::{initialize, StatusPolicy, Step, StepCatalog, StepState};
pub use upload::UploadFile;
