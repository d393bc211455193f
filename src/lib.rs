pub use chroot::NsBoxChroot;
pub use context::{Namespace, NsBoxParams, NsBoxResult};
pub use error::{NsBoxError, NsBoxExit, LAUNCH_FAILURE};
pub use nsbox::{run, DEV_NULL};
pub use stage::{lookup, stage_executable, NsBoxStaged};
pub use utils::default_format;

mod chroot;
mod context;
mod error;
mod nsbox;
mod pipe;
mod stage;
mod utils;
