//! Dependency injection driven by decorator style metadata.
//!
//! The crate consists of the following parts, leaves first:
//!
//! 1. [`decorators`] - attaching [`Metadata`] to classes, properties and constructor parameters
//! 2. [`reflector`] - reading that metadata back, including inherited property metadata
//! 3. [`key`] - the process wide registry turning [`Token`]s into [`Key`]s
//! 4. [`provider`] - validating provider declarations into keyed [`ResolvedProvider`]s
//! 5. [`injector`] - the [`InjectorTree`] instantiating and caching values
//!
//! ```
//! use std::sync::Arc;
//! use ngcore_di::{
//!     decorators::{inject, ClassDecl}, factories::{Args, Class}, injector::InjectorTree,
//!     provider::{provide, ProviderDecl}, types::DynError,
//! };
//!
//! struct Api {
//!     base_url: Arc<String>,
//! }
//! impl Class for Api {
//!     fn construct(args: &Args) -> Result<Self, DynError> {
//!         Ok(Api { base_url: args.get(0)? })
//!     }
//! }
//!
//! ClassDecl::<Api>::new().param(0, inject("baseUrl")).register();
//!
//! let mut tree = InjectorTree::new();
//! let root = tree
//!     .create(None, [
//!         ProviderDecl::class::<Api>(),
//!         provide("baseUrl").use_value(String::from("https://example.org")),
//!     ])
//!     .unwrap();
//!
//! let api = tree.require::<Api>(root).unwrap();
//! assert_eq!(*api.base_url, "https://example.org");
//! ```

pub mod decorators;
pub mod dependency_graph;
pub mod errors;
pub mod factories;
pub mod injector;
pub mod key;
pub mod metadata;
pub mod provider;
pub mod reflector;
pub mod token;
pub mod types;

pub use decorators::ClassDecl;
pub use errors::{ArgError, InjectError, ProviderError};
pub use factories::{Args, Class};
pub use injector::{InjectorId, InjectorTree};
pub use key::Key;
pub use metadata::Metadata;
pub use provider::{provide, DepDecl, ProviderDecl, ResolvedProvider, Visibility};
pub use reflector::{reflector, Reflector};
pub use token::{OpaqueToken, Token};
pub use types::{DynError, Injectable, Instance, TypeInfo};
