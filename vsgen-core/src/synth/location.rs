//! Proxying, redirect and return locations for a single route action.

use crate::conf::types::{
    ActionProxy, ActionRedirect, ActionReturn, ConfigParams, ObjectMeta, Upstream,
};
use crate::document::{AddHeader, ErrorPage, Header, Location, Return, ReturnLocation};
use crate::synth::naming::return_location;

/// Redirect and return locations bounce through this server to trigger their error page.
pub const NGINX_418_SERVER: &str = "http://unix:/var/lib/nginx/nginx-418-server.sock";

/// Placeholder backend for upstreams without live endpoints.
pub const NGINX_502_SERVER: &str = "unix:/var/lib/nginx/nginx-502-server.sock";

/// Where a location sits and what it inherits from its route.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LocationSite<'a> {
    pub path: &'a str,
    /// Path of the route the location was compiled from.
    pub original_path: &'a str,
    pub internal: bool,
    pub snippets: &'a [String],
    pub error_pages: &'a [ErrorPage],
    pub vsr: Option<&'a ObjectMeta>,
}

/// The upstream an action proxies to, as registered for this pass.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ProxyTarget<'a> {
    pub name: &'a str,
    pub upstream: &'a Upstream,
    /// TLS after internal-route and SPIFFE adjustments.
    pub tls: bool,
    pub proxy_ssl_name: &'a str,
}

pub(crate) fn proxy_location(
    site: &LocationSite<'_>,
    target: &ProxyTarget<'_>,
    proxy: Option<&ActionProxy>,
    params: &ConfigParams,
) -> Location {
    let upstream = target.upstream;
    let grpc = upstream.is_grpc();
    let request_headers = proxy.and_then(|p| p.request_headers.as_ref());
    let response_headers = proxy.and_then(|p| p.response_headers.as_ref());
    let (vsr_name, vsr_namespace) = site
        .vsr
        .map(|meta| (meta.name.clone(), meta.namespace.clone()))
        .unwrap_or_default();

    Location {
        path: generate_path(site.path),
        internal: site.internal,
        snippets: site.snippets.to_vec(),
        proxy_connect_timeout: time_with_default(
            &upstream.connect_timeout,
            &params.proxy_connect_timeout,
        ),
        proxy_read_timeout: time_with_default(&upstream.read_timeout, &params.proxy_read_timeout),
        proxy_send_timeout: time_with_default(&upstream.send_timeout, &params.proxy_send_timeout),
        client_max_body_size: string_with_default(
            &upstream.client_max_body_size,
            &params.client_max_body_size,
        ),
        proxy_max_temp_file_size: params.proxy_max_temp_file_size.clone(),
        proxy_buffering: upstream.buffering.unwrap_or(params.proxy_buffering),
        proxy_buffers: upstream
            .buffers
            .as_ref()
            .map(|b| format!("{} {}", b.number, b.size))
            .unwrap_or_else(|| params.proxy_buffers.clone()),
        proxy_buffer_size: string_with_default(&upstream.buffer_size, &params.proxy_buffer_size),
        proxy_pass: proxy_pass(target.tls, target.name, site.internal, proxy),
        proxy_next_upstream: string_with_default(&upstream.next_upstream, "error timeout"),
        proxy_next_upstream_timeout: time_with_default(&upstream.next_upstream_timeout, "0s"),
        proxy_next_upstream_tries: upstream.next_upstream_tries,
        proxy_intercept_errors: !site.error_pages.is_empty(),
        proxy_pass_request_headers: request_headers.and_then(|h| h.pass).unwrap_or(true),
        proxy_set_headers: set_headers(proxy),
        proxy_hide_headers: response_headers.map(|h| h.hide.clone()).unwrap_or_default(),
        proxy_pass_headers: response_headers.map(|h| h.pass.clone()).unwrap_or_default(),
        proxy_ignore_headers: response_headers
            .map(|h| h.ignore.join(" "))
            .unwrap_or_default(),
        add_headers: response_headers
            .map(|h| {
                h.add
                    .iter()
                    .map(|a| AddHeader {
                        name: a.name.clone(),
                        value: a.value.clone(),
                        always: a.always,
                    })
                    .collect()
            })
            .unwrap_or_default(),
        proxy_pass_rewrite: proxy_pass_rewrite(site.path, proxy, site.internal),
        rewrites: rewrites(site.path, proxy, site.internal, site.original_path, grpc),
        has_keepalive: upstream.keepalive.unwrap_or(params.keepalive) != 0,
        error_pages: site.error_pages.to_vec(),
        proxy_ssl_name: target.proxy_ssl_name.to_string(),
        service_name: upstream.service.clone(),
        grpc_pass: if grpc {
            format!("{}://{}", grpc_scheme(target.tls), target.name)
        } else {
            String::new()
        },
        is_vsr: site.vsr.is_some(),
        vsr_name,
        vsr_namespace,
        ..Location::default()
    }
}

pub(crate) fn redirect_location(
    path: &str,
    snippets: &[String],
    redirect: &ActionRedirect,
) -> Location {
    Location {
        path: generate_path(path),
        snippets: snippets.to_vec(),
        proxy_intercept_errors: true,
        internal_proxy_pass: NGINX_418_SERVER.to_string(),
        error_pages: vec![ErrorPage {
            name: redirect.url.clone(),
            codes: "418".to_string(),
            response_code: if redirect.code == 0 { 301 } else { redirect.code },
        }],
        ..Location::default()
    }
}

/// The location answers with a 418 that its error page turns into `@return_{index}`.
pub(crate) fn return_location_pair(
    path: &str,
    snippets: &[String],
    action: &ActionReturn,
    index: usize,
) -> (Location, ReturnLocation) {
    let name = return_location(index);

    let location = Location {
        path: generate_path(path),
        snippets: snippets.to_vec(),
        proxy_intercept_errors: true,
        internal_proxy_pass: NGINX_418_SERVER.to_string(),
        error_pages: vec![ErrorPage {
            name: name.clone(),
            codes: "418".to_string(),
            response_code: if action.code == 0 { 200 } else { action.code },
        }],
        ..Location::default()
    };

    let return_location = ReturnLocation {
        name,
        default_type: string_with_default(&action.content_type, "text/plain"),
        r#return: Return {
            code: 0,
            text: action.body.clone(),
        },
        headers: action
            .headers
            .iter()
            .map(|h| Header::new(&h.name, &h.value))
            .collect(),
    };

    (location, return_location)
}

/// Quotes regular-expression paths so the data plane parses them verbatim.
pub fn generate_path(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~*") {
        return format!("~* \"{}\"", rest.strip_prefix(' ').unwrap_or(rest));
    }
    if let Some(rest) = path.strip_prefix('~') {
        return format!("~ \"{}\"", rest.strip_prefix(' ').unwrap_or(rest));
    }
    path.to_string()
}

/// Bare numbers are seconds; anything else is passed through.
pub fn normalize_time(value: &str) -> String {
    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        format!("{value}s")
    } else {
        value.to_string()
    }
}

/// Global defaults are used as given; only resource values are normalized.
pub fn time_with_default(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        normalize_time(value)
    }
}

pub(crate) fn string_with_default(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

/// Resource snippets replace the defaults only when snippets are enabled.
pub fn snippets(enabled: bool, snippet: &str, defaults: &[String]) -> Vec<String> {
    if !enabled || snippet.is_empty() {
        return defaults.to_vec();
    }
    snippet.split('\n').map(str::to_string).collect()
}

pub(crate) fn scheme(tls: bool) -> &'static str {
    if tls { "https" } else { "http" }
}

fn grpc_scheme(tls: bool) -> &'static str {
    if tls { "grpcs" } else { "grpc" }
}

fn proxy_pass(tls: bool, upstream: &str, internal: bool, proxy: Option<&ActionProxy>) -> String {
    let mut pass = format!("{}://{upstream}", scheme(tls));
    let rewrite = proxy.is_some_and(|p| !p.rewrite_path.is_empty());
    if internal && !rewrite {
        pass.push_str("$request_uri");
    }
    pass
}

fn set_headers(proxy: Option<&ActionProxy>) -> Vec<Header> {
    let configured = proxy
        .and_then(|p| p.request_headers.as_ref())
        .map(|h| h.set.as_slice())
        .unwrap_or_default();

    let mut headers: Vec<Header> = configured
        .iter()
        .map(|h| Header::new(&h.name, &h.value))
        .collect();
    if !configured.iter().any(|h| h.name.eq_ignore_ascii_case("host")) {
        headers.push(Header::new("Host", "$host"));
    }
    headers
}

fn proxy_pass_rewrite(path: &str, proxy: Option<&ActionProxy>, internal: bool) -> String {
    match proxy {
        Some(proxy) if !internal && (path.starts_with('/') || path.starts_with('=')) => {
            proxy.rewrite_path.clone()
        }
        _ => String::new(),
    }
}

/// Internal locations see the rewritten `$request_uri` of the redirect; these
/// rewrites restore the original target before the rewrite path is applied.
pub(crate) fn rewrites(
    path: &str,
    proxy: Option<&ActionProxy>,
    internal: bool,
    original_path: &str,
    grpc: bool,
) -> Vec<String> {
    let Some(rewrite_path) = proxy
        .map(|p| p.rewrite_path.as_str())
        .filter(|p| !p.is_empty())
    else {
        if grpc && internal {
            return vec!["^ $request_uri break".to_string()];
        }
        return Vec::new();
    };

    let path = if original_path.is_empty() {
        path
    } else {
        original_path
    };
    let regex = path.starts_with('~');
    let trimmed = path.strip_prefix('~').unwrap_or(path);
    let trimmed = trimmed.strip_prefix('*').unwrap_or(trimmed).trim();

    let mut rewrites = Vec::new();
    if internal {
        rewrites.push("^ $request_uri_no_args".to_string());
    }
    if regex {
        rewrites.push(format!("\"^{trimmed}\" \"{rewrite_path}\" break"));
    } else if internal {
        rewrites.push(format!("\"^{trimmed}(.*)$\" \"{rewrite_path}$1\" break"));
    }
    rewrites
}

