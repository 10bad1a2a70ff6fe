//! CLI command implementations

pub mod gate;
pub mod pickup;
pub mod plan;
pub mod review;
pub mod signals;
pub mod spike;
pub mod start;
pub mod status;
pub mod verify;
pub mod workspace;

pub use gate::{AdvanceArgs, GateArgs, SendBackArgs};
pub use pickup::PickupArgs;
pub use plan::PlanArgs;
pub use review::{DiffArgs, PrsArgs};
pub use signals::SignalArgs;
pub use spike::SpikeArgs;
pub use start::StartArgs;
pub use status::StatusArgs;
pub use verify::VerifyArgs;
pub use workspace::Workspace;
