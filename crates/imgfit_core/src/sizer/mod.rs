//! Size-targeted image re-encoding.
//!
//! [`ImageSizer`] walks a folder and for each image either probes it
//! (read-only) or shrinks it in place until it fits under the target:
//!
//! 1. **Pre-flight**: parse the target size, check the folder
//! 2. **Discover**: list image files, non-recursive unless configured
//! 3. **Per file**: skip if it already fits, otherwise encode passes chosen
//!    by [`ResizePolicy`] until one fits or the attempts run out
//!
//! Per-file failures (including tool timeouts) are recorded in the
//! [`Report`]; only pre-flight errors abort the run.

mod discovery;
mod errors;
mod policy;
mod processor;
mod types;

pub use discovery::{discover_images, temp_path};
pub use errors::{FileProcessingError, SizerError};
pub use policy::{PassPlan, ResizePolicy};
pub use processor::{preflight, ImageSizer};
pub use types::{Attempt, ImageJob, JobOutcome, JobStatus, Report, RunOptions};
