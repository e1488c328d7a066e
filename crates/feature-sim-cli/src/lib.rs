//! feature-sim CLI — image and photo similarity reports on top of the feature-sim library.

pub mod config;
pub mod frontend;
pub mod output;
pub mod render;

pub use config::{resolve_model_path, resolve_output_dir};
pub use frontend::{Run, SourceKind};
pub use output::{save_run, ResultsFile};
pub use render::RunView;
