mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Connection, Search};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.connection.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "connection.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.connection.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "connection.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.search.search_using.trim().is_empty() {
		return Err(Error::Validation {
			message: "search.search_using must be non-empty.".to_string(),
		});
	}
	if let Some(config) = &cfg.search.config
		&& config.trim().is_empty()
	{
		return Err(Error::Validation {
			message: "search.config must be non-empty when set.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	// Variant names are matched case-insensitively; fold once here.
	cfg.search.search_using = cfg.search.search_using.to_lowercase();
}
