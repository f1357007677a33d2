pub mod context;
pub mod isolated;
pub mod scope;

pub use context::{context_scope, set_context_scope};
pub use isolated::{ArchiveRoot, BundleRoot, IsolatedDomain, IsolatedDomainBuilder, ResolutionRoot};
pub use scope::{CodeScope, Component, ComponentTable, EntryPoint, HandlerFactory, ProviderClass, TableScope};
