pub mod fixtures;
pub mod prepare_env;
pub mod scripted_spi;
