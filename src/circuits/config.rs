use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Where the circuits live and how long the backend may take.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitConfig {
    /// Local directory holding the compiled circuit artifacts.
    pub build_dir: PathBuf,
    /// Remote location serving the artifacts; takes precedence over `build_dir`.
    pub endpoint: Option<String>,
    /// Circuit identifier of the proof of SMP.
    pub proof_of_smp: String,
    /// Circuit identifier of the proof of successful SMP.
    pub proof_successful_smp: String,
    /// Upper bound for a single prove or verify call, in seconds.
    pub timeout_secs: u64,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            build_dir: PathBuf::from("build"),
            endpoint: None,
            proof_of_smp: "proofOfSMP".to_string(),
            proof_successful_smp: "proofSuccessfulSMP".to_string(),
            timeout_secs: 300,
        }
    }
}

/// Artifact locations of one compiled circuit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CircuitArtifacts {
    /// Circuit identifier.
    pub name: String,
    /// Witness generator.
    pub wasm: String,
    /// Proving key.
    pub zkey: String,
    /// Verification key (JSON).
    pub verification_key: String,
}

impl CircuitConfig {
    /// Loads configuration from `.env` file, TOML file, and environment variables.
    ///
    /// Configuration priority (highest to lowest):
    /// 1. Environment variables with `BLIND_FIND_` prefix (e.g., `BLIND_FIND_TIMEOUT_SECS=60`)
    /// 2. TOML configuration file (if exists)
    /// 3. `.env` file (if exists)
    /// 4. Built-in defaults
    ///
    /// The TOML file path can be set via `BLIND_FIND_CONFIG_PATH`. If not set,
    /// defaults to `./config/circuits.toml`. A missing file is skipped.
    ///
    /// # Environment Variable Examples
    /// ```bash
    /// BLIND_FIND_BUILD_DIR=/opt/blind-find/build
    /// BLIND_FIND_ENDPOINT=http://localhost:5000
    /// BLIND_FIND_PROOF_OF_SMP=proofOfSMP
    /// BLIND_FIND_TIMEOUT_SECS=120
    /// ```
    ///
    /// # Errors
    /// Returns [`Error::Config`] if a source is malformed or the result fails
    /// [`CircuitConfig::validate`].
    pub fn from_env() -> Result<Self> {
        use figment::providers::{Env, Format, Serialized, Toml};
        use figment::Figment;

        let _ = dotenvy::dotenv();

        let config_path = std::env::var("BLIND_FIND_CONFIG_PATH")
            .unwrap_or_else(|_| "config/circuits.toml".to_string());

        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(&config_path))
            .merge(Env::prefixed("BLIND_FIND_"))
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns [`Error::Config`] naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if self.proof_of_smp.is_empty() || self.proof_successful_smp.is_empty() {
            return Err(Error::Config("circuit identifiers cannot be empty".to_string()));
        }
        if self.proof_of_smp == self.proof_successful_smp {
            return Err(Error::Config(
                "the two circuits must have different identifiers".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs cannot be zero".to_string()));
        }
        if let Some(endpoint) = &self.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(Error::Config(format!(
                    "endpoint must be an http(s) URL: {endpoint}"
                )));
            }
        }
        Ok(())
    }

    /// Backend call timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolves the artifact locations of circuit `name`.
    pub fn artifacts(&self, name: &str) -> CircuitArtifacts {
        let locate = |file: String| match &self.endpoint {
            Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), file),
            None => self.build_dir.join(file).to_string_lossy().into_owned(),
        };
        CircuitArtifacts {
            name: name.to_string(),
            wasm: locate(format!("{name}.wasm")),
            zkey: locate(format!("{name}.zkey")),
            verification_key: locate(format!("{name}.zkey.json")),
        }
    }

    /// Artifacts of the proof of SMP.
    pub fn proof_of_smp_artifacts(&self) -> CircuitArtifacts {
        self.artifacts(&self.proof_of_smp)
    }

    /// Artifacts of the proof of successful SMP.
    pub fn proof_successful_smp_artifacts(&self) -> CircuitArtifacts {
        self.artifacts(&self.proof_successful_smp)
    }
}
