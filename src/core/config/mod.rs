mod manifest;
mod migrate;
mod properties;

pub use manifest::{
    keys, LauncherConfig, ManifestReader, DEFAULT_SERVER_JAR, LEGACY_OVERRIDE, PRIMARY_OVERRIDE,
};
pub use migrate::{LegacyMigrator, MIGRATION_COMMENT};
pub use properties::Properties;
