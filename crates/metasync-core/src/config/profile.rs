//! Pair profiles

use std::path::Path;

use serde::{Deserialize, Serialize};

use metasync_fs::{ConfigStore, validate_identifier};

use crate::fetch::{Credential, SourceDescriptor};
use crate::{Error, Result};

/// Registry repository that import entries are written into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryTarget {
    /// Owning organization
    pub owner: String,
    /// Source repository under the owner
    pub repository: String,
}

/// One upstream/registry pair. Holds no secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncProfile {
    /// Pair identity; scopes the cache, lock and scripts
    pub name: String,
    pub upstream: SourceDescriptor,
    pub registry: SourceDescriptor,
    pub target: RegistryTarget,
}

impl SyncProfile {
    /// Load a profile file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let profile: SyncProfile = ConfigStore::new().load(path)?;
        profile.validate()?;
        tracing::debug!(path = %path.display(), pair = %profile.name, "Loaded sync profile");
        Ok(profile)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        Ok(ConfigStore::new().save(path, self)?)
    }

    /// Attach run-time credentials.
    pub fn with_credentials(mut self, upstream: Credential, registry: Credential) -> Self {
        self.upstream.credential = upstream;
        self.registry.credential = registry;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_identifier(&self.name)?;
        for source in [&self.upstream, &self.registry] {
            validate_identifier(&source.system)?;
            if source.base_url.trim().is_empty() {
                return Err(Error::invalid_config(format!(
                    "{} base_url must not be empty",
                    source.system
                )));
            }
            if source.timeout_secs == 0 {
                return Err(Error::invalid_config(format!(
                    "{} timeout_secs must be positive",
                    source.system
                )));
            }
        }
        if self.upstream.system == self.registry.system {
            return Err(Error::invalid_config(
                "upstream and registry must name different systems",
            ));
        }
        if self.target.owner.is_empty() || self.target.repository.is_empty() {
            return Err(Error::invalid_config(
                "target owner and repository must not be empty",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::WireFormat;
    use tempfile::TempDir;

    const PROFILE: &str = r#"
name = "pepfar-datim"

[upstream]
system = "dhis2"
base_url = "https://dhis2.example.org"
export_path = "api/metadata.json"
format = "dhis2"

[registry]
system = "ocl"
base_url = "https://api.openconceptlab.org"
export_path = "orgs/PEPFAR/sources/DATIM/export"
format = "ocl"
timeout_secs = 120

[target]
owner = "PEPFAR"
repository = "DATIM"
"#;

    #[test]
    fn loads_toml_profile() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pair.toml");
        std::fs::write(&path, PROFILE).unwrap();

        let profile = SyncProfile::load(&path).unwrap();
        assert_eq!(profile.name, "pepfar-datim");
        assert_eq!(profile.upstream.format, WireFormat::Dhis2);
        assert_eq!(profile.upstream.timeout_secs, 60);
        assert_eq!(profile.registry.timeout_secs, 120);
        assert_eq!(profile.target.repository, "DATIM");
    }

    #[test]
    fn rejects_unsafe_pair_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pair.toml");
        std::fs::write(&path, PROFILE.replace("pepfar-datim", "../escape")).unwrap();

        assert!(matches!(SyncProfile::load(&path), Err(Error::Fs(_))));
    }

    #[test]
    fn rejects_same_system_on_both_sides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pair.toml");
        std::fs::write(&path, PROFILE.replace("system = \"ocl\"", "system = \"dhis2\"")).unwrap();

        assert!(matches!(
            SyncProfile::load(&path),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn save_round_trips_through_json() {
        let dir = TempDir::new().unwrap();
        let toml_path = dir.path().join("pair.toml");
        std::fs::write(&toml_path, PROFILE).unwrap();
        let profile = SyncProfile::load(&toml_path).unwrap();

        let json_path = dir.path().join("pair.json");
        profile.save(&json_path).unwrap();
        assert_eq!(SyncProfile::load(&json_path).unwrap(), profile);
    }
}
