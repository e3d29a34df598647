pub mod settings_loader;

pub use settings_loader::load_artifact_settings;
