pub mod factory;
pub mod status;

pub use factory::{Services, build_services, build_services_with_clients, create_artifact_store};
pub use status::{StatsReport, StoreReport, collect_stats, render_status};
