//! Identifier derivation for generated resources.
//!
//! Two kinds of names come out of here:
//! - logical ids, which address resources inside the template, and
//! - physical names, which the platform sees and length-restricts
//!   (edge function names are capped at 64 characters).
//!
//! Over-long physical names are cut and disambiguated with a short
//! content hash of the untruncated name, so two inputs that collapse to
//! the same truncated prefix still end up with distinct names.

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use crate::error::CompileError;

/// Platform cap for edge function names.
pub const FUNCTION_NAME_MAX_LEN: usize = 64;

/// Platform cap for cache policy names.
pub const CACHE_POLICY_NAME_MAX_LEN: usize = 128;

/// Hex characters kept from the hash when a name is cut.
const HASH_LEN: usize = 6;

/// Externally supplied naming inputs for one compilation.
///
/// The `deployment_id` is the per-deployment disambiguation token. It is
/// folded into the ids of resources whose identity must change when the
/// deployment changes (the distribution); every other id is token-free
/// and stable across deployments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingContext {
    pub app: String,
    pub stage: String,
    pub region: String,
    pub construct: String,
    pub deployment_id: String,
}

impl NamingContext {
    pub fn validate(&self) -> Result<(), CompileError> {
        if self.construct.is_empty() {
            return Err(CompileError::EmptyConstructName);
        }
        Ok(())
    }

    /// Template-internal id for a resource role of this construct.
    pub fn logical_id(&self, role: &str) -> String {
        logical_id(&self.construct, role)
    }

    /// The distribution's logical id carries the deployment id, so the
    /// resource is replaced rather than updated in place.
    pub fn distribution_id(&self) -> String {
        logical_id(&self.construct, &self.deployment_id)
    }

    /// Id of the origin at the given 1-based position in the origins
    /// array, suffixed with a short hash keyed on (construct, position).
    pub fn origin_id(&self, position: usize) -> String {
        format!(
            "{}{}Origin{}{}",
            camelize(&self.construct),
            self.deployment_id,
            position,
            stable_suffix(&format!("{}/Origin{}", self.construct, position))
        )
    }

    /// Platform-visible name `<app>-<stage>-<region>-<construct>-<suffix>`,
    /// cut to `max_len` characters when it overflows.
    pub fn physical_name(&self, suffix: &str, max_len: usize) -> String {
        truncate_with_hash(
            &format!(
                "{}-{}-{}-{}-{}",
                self.app, self.stage, self.region, self.construct, suffix
            ),
            max_len,
        )
    }
}

/// Camel-case a hyphen/underscore/dot separated name.
///
/// `"suuuper-long-construct-name"` becomes `"suuuperLongConstructName"`.
pub fn camelize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut capitalize = false;
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            capitalize = true;
        } else if capitalize {
            out.extend(c.to_uppercase());
            capitalize = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Combine a camel-cased construct name with a resource role label.
pub fn logical_id(construct: &str, role: &str) -> String {
    format!("{}{}", camelize(construct), role)
}

/// Cut `name` down to `max_len` characters, hash-disambiguated.
///
/// Names within the limit pass through unchanged. An over-long name
/// keeps its first `max_len - 7` characters and gets `-` plus the first
/// six hex characters of the MD5 of the *untruncated* name appended, so
/// the result is exactly `max_len` characters long. The cut is a plain
/// character-count cut, not word-aware.
pub fn truncate_with_hash(name: &str, max_len: usize) -> String {
    if name.chars().count() <= max_len {
        return name.to_string();
    }
    let digest = Md5::digest(name.as_bytes());
    let hash = hex::encode(digest);
    let head: String = name.chars().take(max_len - HASH_LEN - 1).collect();
    format!("{head}-{}", &hash[..HASH_LEN])
}

/// Short uppercase hash suffix, pure in its input.
///
/// Keeps renamed or reordered entries from colliding across
/// recompilations.
pub fn stable_suffix(key: &str) -> String {
    let digest = Md5::digest(key.as_bytes());
    hex::encode(digest)[..8].to_uppercase()
}
