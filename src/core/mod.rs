// ─── Bundle Server Launcher Core ───
// Provisions a verified server jar and hands off to the mod loader inside
// an isolated code domain.
//
// Architecture:
//   core/
//     config/    : Embedded manifest, override files, legacy migration
//     downloader/: Streaming download, SHA-1 verification, retry loop
//     domain/    : Code scopes and the isolated game domain
//     runtime/   : Host properties, URL handlers, filesystem providers
//     jimfs/     : Shims bridging the runtime to the server jar's jimfs
//     launch/    : Provision + handoff orchestration

pub mod bundle;
pub mod config;
pub mod domain;
pub mod downloader;
pub mod error;
pub mod hex;
pub mod http;
pub mod jimfs;
pub mod launch;
pub mod runtime;
