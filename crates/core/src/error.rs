//! Error types for statica-core

use thiserror::Error;

/// Errors that can occur while compiling a construct
///
/// All of these are detected before any resource is generated, so a
/// failed compilation never produces a partial template.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(
        "`domain` is set ({domains:?}) but `certificate` is missing: custom domains need a certificate"
    )]
    MissingCertificate { domains: Vec<String> },

    #[error("`redirectToMainDomain` is enabled but no `domain` is declared")]
    RedirectWithoutDomain,

    #[error("`origins[{index}]` has an empty `domain`")]
    EmptyOriginDomain { index: usize },

    #[error("construct name must not be empty")]
    EmptyConstructName,
}
