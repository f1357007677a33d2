pub mod bootstrap;

pub use bootstrap::{Bootstrap, ProvisionedArtifact, GAME_JAR_PATH_PROPERTY};
