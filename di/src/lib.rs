//! # Fibre DI
//!
//! A synchronous, memoizing dependency resolution engine.
//!
//! Values are registered under string tokens as constants, factories or
//! services. Resolving a token recursively resolves the dependencies it
//! declares, detects cycles, caches the result, and falls back to platform
//! modules and a global namespace when nothing is registered.
//!
//! ## Core Concepts
//!
//! - **Registry**: one level of an inheritable chain. `extend` creates a child
//!   that reads through to its parent; writes never leave the level.
//! - **Declarations**: dependencies are an explicit list (which may contain
//!   named groups), the inferred parameter names of a callable, or nothing.
//! - **Resolution**: sources are consulted in a fixed order: per-call
//!   overrides, the registry chain, platform modules, globals.
//! - **Optional resolution**: `_name_` tokens, the `optional` option or the
//!   `optional` config yield `None` instead of failing.
//! - **Hooks**: plugins observe lifecycle events across the whole tree.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_di::{Registry, ResolveOptions};
//!
//! let registry = Registry::new();
//! registry.constant("a", 1_i32).unwrap();
//! registry
//!   .factory("b", ["a"], |args| Ok(*args.get::<i32>(0)? + 1))
//!   .unwrap();
//! registry
//!   .factory("c", ["b"], |args| Ok(*args.get::<i32>(0)? + 1))
//!   .unwrap();
//!
//! assert_eq!(*registry.resolve_as::<i32>("c").unwrap(), 3);
//!
//! // Optional tokens never fail.
//! assert!(registry.resolve("_missing_", ResolveOptions::new()).unwrap().is_none());
//! ```

mod args;
mod config;
mod core;
mod declarator;
mod error;
mod global;
mod hooks;
mod macros;
mod modules;
mod registry;
mod resolver;

pub use args::{ArgCursor, Args, NamedArgs};
pub use config::Config;
pub use crate::core::{downcast, value, LevelId, Lifecycle, Value, OPTIONS_TOKEN};
pub use declarator::{parse_parameters, Declaration, Dependency};
pub use error::{ConfigError, HookError, PluginInstallError, ResolveError, Result};
pub use global::{globals, GlobalScope, Globals};
pub use hooks::{HookBus, HookEvent, HookFn, HookPayload, HostApi, Kind, Plugin, Source};
pub use modules::{ModuleResolver, NoModules, StaticModules};
pub use registry::{Callable, Provider, Registry, RegistryBuilder};
pub use resolver::{Overrides, ResolveOptions};
