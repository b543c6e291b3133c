//! Configuration
//!
//! There is no configuration file. Paths default to the logger's fixed
//! layout and can be overridden from the environment or command line:
//! - Internal SSD mount holding the vehicle folder
//! - External mount root where the removable drive appears
//! - Lock marker and log directory
//! - rsync binary

mod sync_config;
pub mod validation;

pub use sync_config::{
    SyncConfig, ENV_EXTERNAL_ROOT, ENV_INTERNAL_MOUNT, ENV_LOCK_FILE, ENV_LOG_DIR, ENV_RSYNC,
};
pub use validation::{validate_config, validate_config_result, ValidationError};
