//! The constraint rules. Each rule is an independent entry point over a [`Project`].
//!
//! [`Project`]: crate::project::Project

pub mod consistency;
pub mod fields;
pub mod forbid;
pub mod peer_presence;
pub mod pin_ranges;
pub mod workspace_protocol;

mod utils;


pub use consistency::reconcile;
pub use fields::set_fields;
pub use forbid::forbid;
pub use peer_presence::enforce_peer_presence;
pub use pin_ranges::pin_ranges;
pub use utils::{IdentityClassifier, Reporter, Target};
pub use workspace_protocol::enforce_workspace_protocol;
