use std::path::{Path, PathBuf};

use tracing::info;

use super::manifest::{keys, read_override, DEFAULT_SERVER_JAR, LEGACY_OVERRIDE, PRIMARY_OVERRIDE};
use super::properties::Properties;
use crate::core::error::{LauncherError, LauncherResult};

pub const MIGRATION_COMMENT: &str =
    "Bundle server launcher properties - Delete this file to use the default location";

/// Carries a custom `serverJar` from the legacy override file into the
/// primary one, so later runs stop depending on the legacy file.
pub struct LegacyMigrator {
    primary: PathBuf,
    legacy: PathBuf,
}

impl LegacyMigrator {
    pub fn new(work_dir: &Path) -> Self {
        Self {
            primary: work_dir.join(PRIMARY_OVERRIDE),
            legacy: work_dir.join(LEGACY_OVERRIDE),
        }
    }

    pub fn primary_path(&self) -> &Path {
        &self.primary
    }

    pub fn legacy_path(&self) -> &Path {
        &self.legacy
    }

    /// Layer the legacy file onto `props`.
    ///
    /// Returns `true` when the primary override file was written.
    pub async fn migrate(&self, props: &mut Properties) -> LauncherResult<bool> {
        let original = props.get_or(keys::SERVER_JAR, DEFAULT_SERVER_JAR).to_string();

        let Some(text) = read_override(&self.legacy).await? else {
            return Ok(false);
        };
        props.load(&text);

        let effective = props.get_or(keys::SERVER_JAR, &original).to_string();
        if effective == original {
            return Ok(false);
        }

        let mut migrated = Properties::new();
        migrated.set(keys::SERVER_JAR, effective.as_str());

        tokio::fs::write(&self.primary, migrated.store(Some(MIGRATION_COMMENT)))
            .await
            .map_err(|source| LauncherError::ConfigWriteFailure {
                path: self.primary.clone(),
                source,
            })?;

        info!(
            "Migrated serverJar={} from {:?} into {:?}",
            effective, self.legacy, self.primary
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn custom_server_jar_is_written_to_primary() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(LEGACY_OVERRIDE),
            "serverJar=custom/path/server.jar\n",
        )
        .unwrap();
        let migrator = LegacyMigrator::new(dir.path());
        let mut props = Properties::parse("serverJarHash=AA\n");

        assert!(migrator.migrate(&mut props).await.unwrap());

        assert_eq!(props.get(keys::SERVER_JAR), Some("custom/path/server.jar"));
        let written = std::fs::read_to_string(migrator.primary_path()).unwrap();
        let reread = Properties::parse(&written);
        assert_eq!(reread.len(), 1);
        assert_eq!(reread.get(keys::SERVER_JAR), Some("custom/path/server.jar"));
        assert!(written.starts_with(&format!("#{MIGRATION_COMMENT}\n")));
        assert!(written.contains("\nserverJar=custom/path/server.jar\n"));
    }

    #[tokio::test]
    async fn default_server_jar_is_not_migrated() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(LEGACY_OVERRIDE),
            format!("serverJar={DEFAULT_SERVER_JAR}\n"),
        )
        .unwrap();
        let migrator = LegacyMigrator::new(dir.path());
        let mut props = Properties::new();

        assert!(!migrator.migrate(&mut props).await.unwrap());
        assert!(!migrator.primary_path().exists());
    }

    #[tokio::test]
    async fn comparison_is_against_the_embedded_value() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(LEGACY_OVERRIDE), "serverJar=embedded.jar\n").unwrap();
        let migrator = LegacyMigrator::new(dir.path());
        let mut props = Properties::parse("serverJar=embedded.jar\n");

        assert!(!migrator.migrate(&mut props).await.unwrap());
        assert!(!migrator.primary_path().exists());
    }

    #[tokio::test]
    async fn write_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(LEGACY_OVERRIDE), "serverJar=elsewhere.jar\n").unwrap();
        // A directory squatting on the primary path makes the write fail.
        std::fs::create_dir(dir.path().join(PRIMARY_OVERRIDE)).unwrap();
        let migrator = LegacyMigrator::new(dir.path());
        let mut props = Properties::new();

        let err = migrator.migrate(&mut props).await.unwrap_err();
        assert!(matches!(err, LauncherError::ConfigWriteFailure { .. }));
    }
}
