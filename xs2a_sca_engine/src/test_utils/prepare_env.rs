use log::*;

use crate::config::AspspSettings;

/// Loads `.env.test`, starts logging and reads the ASPSP settings from the environment.
pub fn prepare_test_env() -> AspspSettings {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    AspspSettings::from_env_or_default()
}
