pub mod settings;

pub use settings::{
    Settings, StreamingSettings, TerrainSettings, default_settings_path, load_or_default,
    load_settings, save_settings,
};
