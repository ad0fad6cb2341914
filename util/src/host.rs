//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Name of the environment variable pointing at the software root directory.
pub const SW_ROOT_ENV_VAR: &str = "ARGO_SW_ROOT";

/// Get the software root directory from the environment.
///
/// The `params` and `sessions` directories are resolved relative to this
/// root.
pub fn get_sw_root() -> Result<PathBuf, env::VarError> {
    Ok(PathBuf::from(env::var(SW_ROOT_ENV_VAR)?))
}
