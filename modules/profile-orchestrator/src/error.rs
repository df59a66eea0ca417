//! C8 reuses profile-common's `PipelineError` directly rather than defining
//! its own: that enum is already written from "the orchestrator's point of
//! view" (§7), naming every way a run's trajectory can change.

pub use profile_common::{PipelineError, Result};
