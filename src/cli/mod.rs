pub mod orchestration;

pub use orchestration::{
    execute, prepare, report_outcome, run_release_workflow, PreparedRelease, WorkflowArgs,
    WorkflowOutcome,
};
