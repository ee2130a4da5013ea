//! Construct compilation: configuration in, resource graph out.
//!
//! `compile` is a pure, synchronous transformation. Identical inputs
//! produce byte-identical templates; nothing is read from or written to
//! the environment.

use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::behaviors;
use crate::config::SpaConfig;
use crate::error::CompileError;
use crate::functions;
use crate::naming::{self, FUNCTION_NAME_MAX_LEN, NamingContext};
use crate::origins;
use crate::template::{Resource, ResourceKind, Template, get_att, reference};

/// Extension roles the compiler knows how to route to a resource.
const EXTENSION_ROLES: [&str; 6] = [
    "bucket",
    "distribution",
    "originAccessIdentity",
    "requestFunction",
    "responseFunction",
    "cachePolicy",
];

/// Compile one construct into its resource graph.
///
/// Validation runs before any resource is generated, so a configuration
/// error never yields a partial graph. User extensions are applied as
/// the very last step per resource, on top of everything the generator
/// computed.
pub fn compile(config: &SpaConfig, naming: &NamingContext) -> Result<Template, CompileError> {
    naming.validate()?;
    config.validate()?;

    debug!(
        construct = %naming.construct,
        origins = config.origins.len(),
        "compiling single-page app construct"
    );
    for role in config.extensions.keys() {
        if !EXTENSION_ROLES.contains(&role.as_str()) {
            warn!(%role, "extension role matches no generated resource; ignoring");
        }
    }

    let bucket_id = naming.logical_id("Bucket");
    let access_identity_id = naming.logical_id("OriginAccessIdentity");
    let request_function_id = naming.logical_id("RequestFunction");
    let response_function_id = naming.logical_id("ResponseFunction");
    let distribution_id = naming.distribution_id();

    let mut template = Template::new();

    // Private storage bucket; only the distribution reads it, through
    // the access identity.
    let bucket = Resource::new(
        ResourceKind::Bucket,
        json!({
            "BucketEncryption": {
                "ServerSideEncryptionConfiguration": [
                    { "ServerSideEncryptionByDefault": { "SSEAlgorithm": "AES256" } }
                ]
            },
            "PublicAccessBlockConfiguration": {
                "BlockPublicAcls": true,
                "BlockPublicPolicy": true,
                "IgnorePublicAcls": true,
                "RestrictPublicBuckets": true
            }
        }),
    );
    template.add_resource(&bucket_id, with_extension(config, "bucket", bucket));

    let access_identity = Resource::new(
        ResourceKind::OriginAccessIdentity,
        json!({
            "CloudFrontOriginAccessIdentityConfig": {
                "Comment": format!("Access identity for the {} distribution", naming.construct)
            }
        }),
    );
    template.add_resource(
        &access_identity_id,
        with_extension(config, "originAccessIdentity", access_identity),
    );

    let redirect_domain = if config.redirect_to_main_domain {
        config.main_domain()
    } else {
        None
    };
    template.add_resource(
        &request_function_id,
        with_extension(
            config,
            "requestFunction",
            edge_function(
                naming,
                ResourceKind::RequestFunction,
                "request",
                functions::request_function(redirect_domain),
            ),
        ),
    );
    template.add_resource(
        &response_function_id,
        with_extension(
            config,
            "responseFunction",
            edge_function(
                naming,
                ResourceKind::ResponseFunction,
                "response",
                functions::response_function(),
            ),
        ),
    );

    let origin_set = origins::assemble(naming, &bucket_id, &access_identity_id, &config.origins);
    let default_spec = config
        .origins
        .iter()
        .find(|origin| origin.path_pattern.is_none())
        .and_then(|origin| origin.cache_behavior.as_ref());
    let behavior_set = behaviors::assemble(
        naming,
        &origin_set.storage_origin_id,
        &request_function_id,
        &response_function_id,
        default_spec,
        &origin_set.routed,
    );
    for (id, policy) in behavior_set.policies {
        template.add_resource(id, with_extension(config, "cachePolicy", policy));
    }

    let mut distribution_config = json!({
        "Enabled": true,
        "Comment": format!("{} single page app", naming.construct),
        "DefaultRootObject": "index.html",
        "HttpVersion": "http2",
        "IPV6Enabled": true,
        "PriceClass": "PriceClass_100",
        "DefaultCacheBehavior": behavior_set.default_behavior,
        "Origins": origin_set.entries
    });
    if !behavior_set.cache_behaviors.is_empty() {
        distribution_config["CacheBehaviors"] = Value::Array(behavior_set.cache_behaviors);
    }
    if !config.domain.is_empty() {
        distribution_config["Aliases"] = json!(config.domain);
    }
    if let Some(certificate) = &config.certificate {
        distribution_config["ViewerCertificate"] = json!({
            "AcmCertificateArn": certificate,
            "MinimumProtocolVersion": "TLSv1.2_2021",
            "SslSupportMethod": "sni-only"
        });
    }
    let distribution = Resource::new(
        ResourceKind::Distribution,
        json!({ "DistributionConfig": distribution_config }),
    );
    template.add_resource(
        &distribution_id,
        with_extension(config, "distribution", distribution),
    );

    let prefix = naming::camelize(&naming.construct);
    template.add_output(
        format!("{prefix}BucketName"),
        "Name of the bucket that stores the site assets",
        reference(&bucket_id),
    );
    let domain_value = match config.main_domain() {
        Some(domain) => json!(domain),
        None => get_att(&distribution_id, "DomainName"),
    };
    template.add_output(
        format!("{prefix}Domain"),
        "Domain the site is served from",
        domain_value,
    );
    template.add_output(
        format!("{prefix}CloudFrontDomain"),
        "Public domain name of the distribution",
        get_att(&distribution_id, "DomainName"),
    );

    Ok(template)
}

fn edge_function(
    naming: &NamingContext,
    kind: ResourceKind,
    suffix: &str,
    code: String,
) -> Resource {
    let name = naming.physical_name(suffix, FUNCTION_NAME_MAX_LEN);
    Resource::new(
        kind,
        json!({
            "AutoPublish": true,
            "FunctionCode": code,
            "FunctionConfig": {
                "Comment": name,
                "Runtime": "cloudfront-js-1.0"
            },
            "Name": name
        }),
    )
}

fn with_extension(config: &SpaConfig, role: &str, mut resource: Resource) -> Resource {
    if let Some(extension) = config.extensions.get(role) {
        resource.apply_extension(extension);
    }
    resource
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AllowedMethods, CacheBehaviorSpec, OriginSpec};

    const CERTIFICATE: &str =
        "arn:aws:acm:us-east-1:123456615250:certificate/0a28e63d-d3a9-4578-9f8b-14347bfe8123";

    fn naming() -> NamingContext {
        NamingContext {
            app: "app".to_string(),
            stage: "dev".to_string(),
            region: "us-east-1".to_string(),
            construct: "landing".to_string(),
            deployment_id: "123456789".to_string(),
        }
    }

    fn base_config() -> SpaConfig {
        SpaConfig {
            domain: vec!["www.example.com".to_string(), "example.com".to_string()],
            certificate: Some(CERTIFICATE.to_string()),
            ..SpaConfig::default()
        }
    }

    fn api_origin() -> OriginSpec {
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
    fn storage_only_site_has_a_single_origin() {
        let template = compile(&base_config(), &naming()).unwrap();

        let distribution = &template.resources["landing123456789"];
        assert_eq!(distribution.kind, ResourceKind::Distribution);
        let config = &distribution.properties["DistributionConfig"];
        assert_eq!(config["Origins"].as_array().unwrap().len(), 1);
        assert!(config.get("CacheBehaviors").is_none());
        assert_eq!(config["Aliases"], json!(["www.example.com", "example.com"]));
        assert_eq!(config["ViewerCertificate"]["AcmCertificateArn"], CERTIFICATE);

        let associations = config["DefaultCacheBehavior"]["FunctionAssociations"]
            .as_array()
            .unwrap();
        assert_eq!(associations[0]["EventType"], "viewer-response");
        assert_eq!(associations[1]["EventType"], "viewer-request");
    }

    #[test]
    fn every_expected_resource_is_generated() {
        let template = compile(&base_config(), &naming()).unwrap();
        for id in [
            "landingBucket",
            "landingOriginAccessIdentity",
            "landingRequestFunction",
            "landingResponseFunction",
            "landing123456789",
        ] {
            assert!(template.resources.contains_key(id), "missing {id}");
        }
    }

    #[test]
    fn request_function_resource_matches_its_physical_name() {
        let template = compile(&base_config(), &naming()).unwrap();
        let function = &template.resources["landingRequestFunction"];
        assert_eq!(function.properties["Name"], "app-dev-us-east-1-landing-request");
        assert_eq!(
            function.properties["FunctionConfig"]["Comment"],
            "app-dev-us-east-1-landing-request"
        );
        assert_eq!(
            function.properties["FunctionConfig"]["Runtime"],
            "cloudfront-js-1.0"
        );
        assert_eq!(function.properties["AutoPublish"], true);
        let code = function.properties["FunctionCode"].as_str().unwrap();
        assert!(code.contains("var REDIRECT_REGEX"));
        // No redirect requested: the host check stays out.
        assert!(!code.contains("statusCode: 301"));
    }

    #[test]
    fn api_origin_adds_an_origin_and_a_routed_behavior() {
        let mut config = base_config();
        config.origins = vec![api_origin()];
        let template = compile(&config, &naming()).unwrap();

        let node = &template.resources["landing123456789"].properties["DistributionConfig"];
        let origins = node["Origins"].as_array().unwrap();
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[1]["DomainName"], "api.example.com");
        assert_eq!(origins[1]["OriginPath"], "/api");
        assert_eq!(
            origins[1]["CustomOriginConfig"]["OriginProtocolPolicy"],
            "https-only"
        );

        let behaviors = node["CacheBehaviors"].as_array().unwrap();
        assert_eq!(behaviors.len(), 1);
        assert_eq!(behaviors[0]["PathPattern"], "api/*");
        assert_eq!(
            behaviors[0]["AllowedMethods"],
            json!(["GET", "HEAD", "OPTIONS", "PUT", "PATCH", "POST", "DELETE"])
        );
        assert_eq!(behaviors[0]["TargetOriginId"], origins[1]["Id"]);

        let policy_id = behaviors[0]["CachePolicyId"]["Ref"].as_str().unwrap();
        assert_eq!(policy_id, "landingOrigin2CachePolicy");
        assert_eq!(
            template.resources[policy_id].kind,
            ResourceKind::CachePolicy
        );
    }

    #[test]
    fn redirect_embeds_the_main_domain_in_the_request_function() {
        let mut config = base_config();
        config.redirect_to_main_domain = true;
        let template = compile(&config, &naming()).unwrap();
        let code = template.resources["landingRequestFunction"].properties["FunctionCode"]
            .as_str()
            .unwrap();
        assert!(code.contains(r#"request.headers["host"].value !== "www.example.com""#));
        assert!(code.contains(r#"value: "https://www.example.com" + request.uri"#));
    }

    #[test]
    fn extensions_override_generated_properties() {
        let mut config = SpaConfig::default();
        config.extensions.insert(
            "distribution".to_string(),
            json!({
                "Properties": {
                    "DistributionConfig": { "Comment": "This is my comment" }
                }
            }),
        );
        config.extensions.insert(
            "bucket".to_string(),
            json!({ "Properties": { "ObjectLockEnabled": true } }),
        );
        let template = compile(&config, &naming()).unwrap();

        let distribution = &template.resources["landing123456789"];
        assert_eq!(
            distribution.properties["DistributionConfig"]["Comment"],
            "This is my comment"
        );
        // Sibling generated keys survive the merge.
        assert_eq!(distribution.properties["DistributionConfig"]["Enabled"], true);
        assert_eq!(
            template.resources["landingBucket"].properties["ObjectLockEnabled"],
            true
        );
    }

    #[test]
    fn patternless_origin_customizes_the_default_behavior() {
        let mut config = base_config();
        config.origins = vec![OriginSpec {
            path: None,
            path_pattern: None,
            domain: "fallback.example.com".to_string(),
            cache_behavior: Some(CacheBehaviorSpec {
                allowed_methods: AllowedMethods::ReadOnly,
                cache_options_method: false,
                headers: vec!["Authorization".to_string()],
            }),
        }];
        let template = compile(&config, &naming()).unwrap();
        let node = &template.resources["landing123456789"].properties["DistributionConfig"];
        assert_eq!(node["Origins"].as_array().unwrap().len(), 1);
        assert!(node.get("CacheBehaviors").is_none());
        assert_eq!(
            node["DefaultCacheBehavior"]["CachePolicyId"],
            json!({ "Ref": "landingOrigin1CachePolicy" })
        );
        assert!(template.resources.contains_key("landingOrigin1CachePolicy"));
    }

    #[test]
    fn long_construct_names_yield_trimmed_function_names() {
        let naming = NamingContext {
            app: "app".to_string(),
            stage: "super-long-stage-name".to_string(),
            region: "us-east-1".to_string(),
            construct: "suuuper-long-construct-name".to_string(),
            deployment_id: "123456789".to_string(),
        };
        let template = compile(&SpaConfig::default(), &naming).unwrap();
        assert_eq!(
            template.resources["suuuperLongConstructNameRequestFunction"].properties["Name"],
            "app-super-long-stage-name-us-east-1-suuuper-long-construc-f3b7e1"
        );
        assert_eq!(
            template.resources["suuuperLongConstructNameResponseFunction"].properties["Name"],
            "app-super-long-stage-name-us-east-1-suuuper-long-construc-8c1f76"
        );
    }

    #[test]
    fn outputs_expose_the_distribution_domain() {
        let template = compile(&base_config(), &naming()).unwrap();
        assert_eq!(template.outputs["landingDomain"].value, "www.example.com");
        assert_eq!(
            template.outputs["landingCloudFrontDomain"].value,
            get_att("landing123456789", "DomainName")
        );
        assert_eq!(
            template.outputs["landingBucketName"].value,
            reference("landingBucket")
        );
    }

    #[test]
    fn outputs_fall_back_to_the_distribution_domain_without_custom_domains() {
        let template = compile(&SpaConfig::default(), &naming()).unwrap();
        assert_eq!(
            template.outputs["landingDomain"].value,
            get_att("landing123456789", "DomainName")
        );
    }

    #[test]
    fn compilation_is_deterministic() {
        let mut config = base_config();
        config.origins = vec![api_origin()];
        config.redirect_to_main_domain = true;
        let first = serde_json::to_string(&compile(&config, &naming()).unwrap()).unwrap();
        let second = serde_json::to_string(&compile(&config, &naming()).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn configuration_errors_abort_before_generation() {
        let config = SpaConfig {
            domain: vec!["example.com".to_string()],
            ..SpaConfig::default()
        };
        assert!(matches!(
            compile(&config, &naming()),
            Err(CompileError::MissingCertificate { .. })
        ));
    }

    #[test]
    fn empty_construct_names_are_rejected() {
        let mut naming = naming();
        naming.construct = String::new();
        assert!(matches!(
            compile(&SpaConfig::default(), &naming),
            Err(CompileError::EmptyConstructName)
        ));
    }
}
