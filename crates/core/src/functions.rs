//! Edge function source synthesis.
//!
//! The function bodies are fixed templates; the only substituted
//! parameter is the main domain used by the redirect check. Everything
//! else, including the asset-extension regex, is a literal constant.

/// Source of the viewer-request function.
///
/// Any URI without a dot, or whose trailing dot-extension is not in the
/// static-asset allow-list, is rewritten to `/index.html` so client-side
/// routing keeps working on deep links. With `main_domain` set, requests
/// arriving on any other host are answered with a 301 to the main
/// domain, preserving the already-rewritten path.
pub fn request_function(main_domain: Option<&str>) -> String {
    let redirect_block = match main_domain {
        Some(domain) => format!(
            r#"
    if (request.headers["host"].value !== "{domain}") {{
        return {{
            statusCode: 301,
            statusDescription: "Moved Permanently",
            headers: {{
                location: {{
                    value: "https://{domain}" + request.uri
                }}
            }}
        }};
    }}"#
        ),
        None => String::new(),
    };

    format!(
        r#"var REDIRECT_REGEX = /^[^.]+$|\.(?!(css|gif|ico|jpg|jpeg|js|png|txt|svg|woff|woff2|ttf|map|json|webp|xml|pdf|webmanifest|avif|wasm)$)([^.]+$)/;

function handler(event) {{
    var uri = event.request.uri;
    var request = event.request;
    var isUriToRedirect = REDIRECT_REGEX.test(uri);

    if (isUriToRedirect) {{
        request.uri = "/index.html";
    }}{redirect_block}

    return event.request;
}}"#
    )
}

/// Source of the viewer-response function: a fixed set of security
/// headers stamped onto every response.
pub fn response_function() -> String {
    r#"function handler(event) {
    var response = event.response;
    var headers = response.headers;

    headers["x-content-type-options"] = { value: "nosniff" };
    headers["x-frame-options"] = { value: "SAMEORIGIN" };
    headers["x-xss-protection"] = { value: "1; mode=block" };
    headers["strict-transport-security"] = { value: "max-age=63072000" };

    return response;
}"#
    .to_string()
}
