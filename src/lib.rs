pub mod config;
pub mod generator;
pub mod model;
pub mod qa;
pub mod types;

pub use config::Settings;
pub use generator::generate;
pub use model::build_model_and_tokenizer;
pub use qa::QaStore;

pub mod state;
pub use state::AppState;
pub mod api;
