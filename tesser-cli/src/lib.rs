pub mod app;
pub mod bars;
pub mod output;
pub mod telemetry;

pub use app::run as run_app;
