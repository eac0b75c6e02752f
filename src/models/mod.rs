pub mod user;
pub mod tip;
pub mod plan;

pub use user::{SessionUser, User};
pub use tip::{concern_options, custom_concern, resolve_concern, ConcernOption, Tip, CONCERNS};
pub use plan::Plan;
