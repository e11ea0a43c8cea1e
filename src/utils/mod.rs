pub mod constants;
pub mod coordinates;
pub mod filename;
pub mod progress;
pub mod stats;

pub use constants::*;
pub use coordinates::{normalize_name, KnownPlace, ZoneLocator};
pub use filename::generate_default_export_filename;
pub use progress::ProgressReporter;
