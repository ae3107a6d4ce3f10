mod paths;
mod settings;

pub(crate) use paths::{cache_dir, data_dir, log_file_path, settings_path};
pub(crate) use settings::load_settings;
