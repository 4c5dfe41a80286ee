//! Domain logic - pure release rules independent of git and the hosting API

pub mod plan;
pub mod tag;
pub mod version;

pub use plan::{ReleasePlan, ReleaseRequest, RequestKind};
pub use tag::{CommitId, TagPattern, TagRef};
pub use version::{BumpKind, Version};
