//! statica-core: compiles a declarative single-page-app description
//! into a cloud content-delivery resource graph.
//!
//! Given a [`SpaConfig`] and a [`NamingContext`], [`compile`] produces a
//! [`Template`] holding a private storage bucket, an origin access
//! identity, two edge functions (client-side-routing fallback and
//! security headers), any dedicated cache policies, and a distribution
//! with ordered origins and cache behaviors. The whole transformation
//! is pure and deterministic; the host that deploys the template is a
//! separate concern.

pub mod behaviors;
pub mod compiler;
pub mod config;
pub mod error;
pub mod functions;
pub mod merge;
pub mod naming;
pub mod origins;
pub mod template;

pub use compiler::compile;
pub use config::{AllowedMethods, CacheBehaviorSpec, OriginSpec, SpaConfig};
pub use error::CompileError;
pub use naming::NamingContext;
pub use template::{Output, Resource, ResourceKind, Template};

/// Result type for compilation.
pub type Result<T> = std::result::Result<T, CompileError>;
