//! Construct configuration and eager validation.
//!
//! This is the declarative input of the compiler: domains, certificate,
//! extra origins, the main-domain redirect flag, and raw property
//! overrides. Validation runs up front so a bad configuration never
//! produces a partial resource graph.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CompileError;

/// Declarative description of a single-page app construct.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpaConfig {
    /// Root directory of the built site assets. Consumed by the
    /// uploader, not by the compiler.
    pub path: Option<PathBuf>,
    /// Custom domains in declaration order; the first one is the main
    /// domain. Accepts a single string or a list.
    #[serde(deserialize_with = "one_or_many")]
    pub domain: Vec<String>,
    /// Certificate reference covering the custom domains.
    pub certificate: Option<String>,
    /// Extra origins behind the distribution, in evaluation order.
    pub origins: Vec<OriginSpec>,
    /// Answer on every domain but the first with a 301 to the first.
    pub redirect_to_main_domain: bool,
    /// Raw property overrides, keyed by resource role
    /// (e.g. "distribution", "bucket").
    pub extensions: BTreeMap<String, Value>,
}

impl SpaConfig {
    /// Check the configuration before anything is generated.
    pub fn validate(&self) -> Result<(), CompileError> {
        if !self.domain.is_empty() && self.certificate.is_none() {
            return Err(CompileError::MissingCertificate {
                domains: self.domain.clone(),
            });
        }
        if self.redirect_to_main_domain && self.domain.is_empty() {
            return Err(CompileError::RedirectWithoutDomain);
        }
        for (index, origin) in self.origins.iter().enumerate() {
            if origin.domain.is_empty() {
                return Err(CompileError::EmptyOriginDomain { index });
            }
        }
        Ok(())
    }

    /// The first declared domain, if any.
    pub fn main_domain(&self) -> Option<&str> {
        self.domain.first().map(String::as_str)
    }
}

/// An upstream origin declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginSpec {
    /// Origin-side path prefix sent with every forwarded request.
    #[serde(default)]
    pub path: Option<String>,
    /// Distribution-side match pattern. Without one the spec augments
    /// the default behavior instead of adding a routed origin.
    #[serde(default)]
    pub path_pattern: Option<String>,
    /// Upstream host name.
    pub domain: String,
    #[serde(default)]
    pub cache_behavior: Option<CacheBehaviorSpec>,
}

/// Cache settings for one origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheBehaviorSpec {
    pub allowed_methods: AllowedMethods,
    /// Cache OPTIONS responses as well.
    #[serde(default)]
    pub cache_options_method: bool,
    /// Headers forwarded into the cache key; the single entry `"*"`
    /// forwards them all.
    #[serde(default)]
    pub headers: Vec<String>,
}

impl CacheBehaviorSpec {
    /// Whether these settings differ from the shared default cache
    /// policy and need a dedicated policy resource.
    pub fn needs_dedicated_policy(&self) -> bool {
        !self.headers.is_empty() || self.cache_options_method
    }
}

/// HTTP verbs a behavior accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllowedMethods {
    #[serde(rename = "readOnly")]
    ReadOnly,
    #[serde(rename = "all")]
    All,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(domain) => vec![domain],
        OneOrMany::Many(domains) => domains,
    })
}
