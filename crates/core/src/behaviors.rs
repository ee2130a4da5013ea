//! Cache behavior and cache policy assembly.
//!
//! The default behavior always targets the storage origin and carries
//! both edge functions. Every routed origin with declared cache settings
//! gets a path-pattern behavior, emitted in declaration order (the
//! distribution evaluates them first-match-wins, so order is part of the
//! caller's contract). Behaviors whose cache requirements match the
//! shared managed policy reference it by id; the rest get a dedicated
//! cache policy resource.

use serde_json::{Value, json};
use tracing::debug;

use crate::config::{AllowedMethods, CacheBehaviorSpec};
use crate::naming::{CACHE_POLICY_NAME_MAX_LEN, NamingContext};
use crate::origins::RoutedOrigin;
use crate::template::{Resource, ResourceKind, get_att, reference};

/// Managed "CachingOptimized" policy, shared by every behavior with
/// default cache requirements.
pub const DEFAULT_CACHE_POLICY_ID: &str = "658327ea-f89d-4fab-a63d-7e88639e58f6";

const CACHED_METHODS: [&str; 3] = ["GET", "HEAD", "OPTIONS"];
const READ_ONLY_METHODS: [&str; 3] = ["GET", "HEAD", "OPTIONS"];
const ALL_METHODS: [&str; 7] = ["GET", "HEAD", "OPTIONS", "PUT", "PATCH", "POST", "DELETE"];

/// Everything behavior assembly produces.
#[derive(Debug)]
pub struct BehaviorSet {
    pub default_behavior: Value,
    /// Path-pattern behaviors in origin declaration order.
    pub cache_behaviors: Vec<Value>,
    /// Generated dedicated cache policies, keyed by logical id.
    pub policies: Vec<(String, Resource)>,
}

/// Assemble the default behavior and one behavior per routed origin
/// with cache settings.
///
/// `default_spec` is the cache behavior of a pattern-less origin spec,
/// if any; it retargets the default behavior's methods and policy.
pub fn assemble(
    naming: &NamingContext,
    storage_origin_id: &str,
    request_function_id: &str,
    response_function_id: &str,
    default_spec: Option<&CacheBehaviorSpec>,
    routed: &[RoutedOrigin<'_>],
) -> BehaviorSet {
    let mut policies = Vec::new();

    let mut default_behavior = json!({
        "TargetOriginId": storage_origin_id,
        "ViewerProtocolPolicy": "redirect-to-https",
        "Compress": true,
        "CachePolicyId": DEFAULT_CACHE_POLICY_ID,
        "FunctionAssociations": [
            {
                "EventType": "viewer-response",
                "FunctionARN": get_att(response_function_id, "FunctionARN")
            },
            {
                "EventType": "viewer-request",
                "FunctionARN": get_att(request_function_id, "FunctionARN")
            }
        ]
    });
    if let Some(spec) = default_spec {
        default_behavior["AllowedMethods"] = allowed_methods(spec.allowed_methods);
        default_behavior["CachedMethods"] = json!(CACHED_METHODS);
        if spec.needs_dedicated_policy() {
            let (id, policy) = cache_policy(naming, 1, spec);
            default_behavior["CachePolicyId"] = reference(&id);
            policies.push((id, policy));
        }
    }

    let mut cache_behaviors = Vec::new();
    for origin in routed {
        let Some(spec) = &origin.spec.cache_behavior else {
            continue;
        };
        // Routed origins always carry a pattern.
        let pattern = origin.spec.path_pattern.as_deref().unwrap_or_default();
        let mut behavior = json!({
            "PathPattern": format!("{pattern}*"),
            "TargetOriginId": origin.id,
            "AllowedMethods": allowed_methods(spec.allowed_methods),
            "CachedMethods": CACHED_METHODS,
            "Compress": true,
            "ViewerProtocolPolicy": "allow-all",
            "CachePolicyId": DEFAULT_CACHE_POLICY_ID
        });
        if spec.needs_dedicated_policy() {
            let (id, policy) = cache_policy(naming, origin.position, spec);
            behavior["CachePolicyId"] = reference(&id);
            policies.push((id, policy));
        }
        cache_behaviors.push(behavior);
    }

    BehaviorSet {
        default_behavior,
        cache_behaviors,
        policies,
    }
}

fn allowed_methods(allowed: AllowedMethods) -> Value {
    match allowed {
        AllowedMethods::ReadOnly => json!(READ_ONLY_METHODS),
        AllowedMethods::All => json!(ALL_METHODS),
    }
}

/// A dedicated cache policy for one origin position.
fn cache_policy(
    naming: &NamingContext,
    position: usize,
    spec: &CacheBehaviorSpec,
) -> (String, Resource) {
    let id = naming.logical_id(&format!("Origin{position}CachePolicy"));
    debug!(policy = %id, "generating dedicated cache policy");
    let headers_config = if spec.headers.is_empty() {
        json!({ "HeaderBehavior": "none" })
    } else {
        json!({ "HeaderBehavior": "whitelist", "Headers": spec.headers })
    };
    let properties = json!({
        "CachePolicyConfig": {
            "Name": naming.physical_name(&format!("origin{position}"), CACHE_POLICY_NAME_MAX_LEN),
            "DefaultTTL": 0,
            "MinTTL": 0,
            "MaxTTL": 31536000,
            "ParametersInCacheKeyAndForwardedToOrigin": {
                "EnableAcceptEncodingBrotli": false,
                "EnableAcceptEncodingGzip": false,
                "CookiesConfig": { "CookieBehavior": "all" },
                "QueryStringsConfig": { "QueryStringBehavior": "all" },
                "HeadersConfig": headers_config
            }
        }
    });
    (id, Resource::new(ResourceKind::CachePolicy, properties))
}
