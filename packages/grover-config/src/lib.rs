mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, Providers, Qdrant, Quantum, Search, Service, Storage,
};

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
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation { message: "service.http_bind must be non-empty.".to_string() });
	}
	if cfg.storage.qdrant.collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.collection must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if cfg.providers.embedding.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.embedding.api_key must be non-empty.".to_string(),
		});
	}
	if cfg.search.default_top_k == 0 {
		return Err(Error::Validation {
			message: "search.default_top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.search.max_top_k < cfg.search.default_top_k {
		return Err(Error::Validation {
			message: "search.max_top_k must be search.default_top_k or greater.".to_string(),
		});
	}
	if cfg.search.max_query_chars == 0 {
		return Err(Error::Validation {
			message: "search.max_query_chars must be greater than zero.".to_string(),
		});
	}
	if !cfg.search.similarity_threshold.is_finite() {
		return Err(Error::Validation {
			message: "search.similarity_threshold must be a finite number.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.search.similarity_threshold) {
		return Err(Error::Validation {
			message: "search.similarity_threshold must be in the range 0.0-1.0.".to_string(),
		});
	}
	if !cfg.quantum.boost_factor.is_finite() {
		return Err(Error::Validation {
			message: "quantum.boost_factor must be a finite number.".to_string(),
		});
	}
	if cfg.quantum.boost_factor < 0.0 {
		return Err(Error::Validation {
			message: "quantum.boost_factor must be zero or greater.".to_string(),
		});
	}
	if !(1..=30).contains(&cfg.quantum.max_qubits) {
		return Err(Error::Validation {
			message: "quantum.max_qubits must be in the range 1-30.".to_string(),
		});
	}
	if cfg.quantum.iteration_cap == 0 {
		return Err(Error::Validation {
			message: "quantum.iteration_cap must be greater than zero.".to_string(),
		});
	}
	if cfg.quantum.shots == 0 {
		return Err(Error::Validation {
			message: "quantum.shots must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.storage.qdrant.url = cfg.storage.qdrant.url.trim().to_string();
	cfg.storage.qdrant.collection = cfg.storage.qdrant.collection.trim().to_string();
	cfg.providers.embedding.api_base =
		cfg.providers.embedding.api_base.trim().trim_end_matches('/').to_string();
	cfg.providers.embedding.model = cfg.providers.embedding.model.trim().to_string();
}
