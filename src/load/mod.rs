//! The load-generation core: parameter grids, provisioning, statistics,
//! shutdown coordination, and the worker pool.

mod grid;
mod provision;
mod shutdown;
mod stats;
mod worker;

pub use grid::ParameterGrid;
pub use provision::TraderProvisioner;
pub use shutdown::{ShutdownCoordinator, ShutdownFlag, SignalAction, FORCED_EXIT_CODE};
pub use stats::{StatsAggregator, StatsSnapshot};
pub use worker::WorkerPool;
