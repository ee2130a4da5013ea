//! Origin assembly for the distribution.
//!
//! Position 0 is always the implicit storage origin, wired to the
//! bucket's regional domain name through the origin access identity so
//! the bucket itself stays private. Every user origin with a
//! `path_pattern` is appended after it; specs without one only augment
//! the default behavior and get no entry of their own.

use serde_json::{Value, json};

use crate::config::OriginSpec;
use crate::naming::NamingContext;
use crate::template::{get_att, reference};

/// A user origin that got its own entry in the origins array.
#[derive(Debug)]
pub struct RoutedOrigin<'a> {
    pub id: String,
    /// 1-based position in the origins array.
    pub position: usize,
    pub spec: &'a OriginSpec,
}

/// The assembled origins array plus what behavior assembly needs.
#[derive(Debug)]
pub struct OriginSet<'a> {
    /// Ordered `Origins` entries, storage origin first.
    pub entries: Vec<Value>,
    /// Id of the storage origin.
    pub storage_origin_id: String,
    pub routed: Vec<RoutedOrigin<'a>>,
}

/// Build the ordered origins array for a construct.
pub fn assemble<'a>(
    naming: &NamingContext,
    bucket_id: &str,
    access_identity_id: &str,
    specs: &'a [OriginSpec],
) -> OriginSet<'a> {
    let storage_origin_id = naming.origin_id(1);
    let mut entries = Vec::with_capacity(specs.len() + 1);
    entries.push(json!({
        "Id": storage_origin_id,
        "DomainName": get_att(bucket_id, "RegionalDomainName"),
        "S3OriginConfig": {
            "OriginAccessIdentity": {
                "Fn::Join": [
                    "",
                    ["origin-access-identity/cloudfront/", reference(access_identity_id)]
                ]
            }
        }
    }));

    let mut routed = Vec::new();
    let mut position = 1;
    for spec in specs {
        if spec.path_pattern.is_none() {
            continue;
        }
        position += 1;
        let id = naming.origin_id(position);
        let mut entry = json!({
            "Id": id,
            "DomainName": spec.domain,
            "CustomOriginConfig": {
                "OriginProtocolPolicy": "https-only",
                "OriginSSLProtocols": ["TLSv1.2"]
            }
        });
        if let Some(path) = &spec.path {
            entry["OriginPath"] = json!(path);
        }
        entries.push(entry);
        routed.push(RoutedOrigin { id, position, spec });
    }

    OriginSet {
        entries,
        storage_origin_id,
        routed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AllowedMethods, CacheBehaviorSpec};

    fn naming() -> NamingContext {
        NamingContext {
            app: "app".to_string(),
            stage: "dev".to_string(),
            region: "us-east-1".to_string(),
            construct: "landing".to_string(),
            deployment_id: "123456789".to_string(),
        }
    }

    fn api_spec() -> OriginSpec {
        OriginSpec {
            path: Some("/api".to_string()),
            path_pattern: Some("api/".to_string()),
            domain: "api.example.com".to_string(),
            cache_behavior: Some(CacheBehaviorSpec {
                allowed_methods: AllowedMethods::All,
                cache_options_method: true,
                headers: vec!["*".to_string()],
            }),
        }
    }

    #[test]
    fn storage_origin_comes_first() {
        let set = assemble(&naming(), "landingBucket", "landingOriginAccessIdentity", &[]);
        assert_eq!(set.entries.len(), 1);
        let storage = &set.entries[0];
        assert_eq!(storage["Id"], json!(set.storage_origin_id));
        assert_eq!(
            storage["DomainName"],
            json!({ "Fn::GetAtt": ["landingBucket", "RegionalDomainName"] })
        );
        assert_eq!(
            storage["S3OriginConfig"]["OriginAccessIdentity"],
            json!({
                "Fn::Join": [
                    "",
                    [
                        "origin-access-identity/cloudfront/",
                        { "Ref": "landingOriginAccessIdentity" }
                    ]
                ]
            })
        );
    }

    #[test]
    fn custom_origins_are_https_only() {
        let specs = vec![api_spec()];
        let set = assemble(&naming(), "landingBucket", "landingOriginAccessIdentity", &specs);
        assert_eq!(set.entries.len(), 2);
        let custom = &set.entries[1];
        assert_eq!(custom["DomainName"], "api.example.com");
        assert_eq!(custom["OriginPath"], "/api");
        assert_eq!(custom["CustomOriginConfig"]["OriginProtocolPolicy"], "https-only");
        assert_eq!(
            custom["CustomOriginConfig"]["OriginSSLProtocols"],
            json!(["TLSv1.2"])
        );
        assert_eq!(set.routed.len(), 1);
        assert_eq!(set.routed[0].position, 2);
    }

    #[test]
    fn origin_without_path_has_no_origin_path() {
        let mut spec = api_spec();
        spec.path = None;
        let specs = vec![spec];
        let set = assemble(&naming(), "landingBucket", "landingOriginAccessIdentity", &specs);
        assert!(set.entries[1].get("OriginPath").is_none());
    }

    #[test]
    fn patternless_specs_do_not_become_origins() {
        let mut spec = api_spec();
        spec.path_pattern = None;
        let specs = vec![spec];
        let set = assemble(&naming(), "landingBucket", "landingOriginAccessIdentity", &specs);
        assert_eq!(set.entries.len(), 1);
        assert!(set.routed.is_empty());
    }

    #[test]
    fn origin_ids_are_stable_across_assemblies() {
        let specs = vec![api_spec()];
        let first = assemble(&naming(), "landingBucket", "landingOriginAccessIdentity", &specs);
        let second = assemble(&naming(), "landingBucket", "landingOriginAccessIdentity", &specs);
        assert_eq!(first.entries, second.entries);
    }
}
