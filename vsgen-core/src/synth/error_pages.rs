use crate::conf::types::{ErrorPage, ErrorPageAction, ResourceRef};
use crate::document::{self, ErrorPageLocation, Header, Return};
use crate::synth::naming::error_page_location;

/// HTTP-only status codes a gRPC upstream never produces.
const GRPC_CONFLICTING_CODES: [u16; 19] = [
    400, 401, 403, 404, 405, 408, 413, 414, 415, 426, 429, 495, 496, 497, 500, 501, 502, 503, 504,
];

/// A route's error pages together with where their named locations start.
#[derive(Debug, Clone)]
pub(crate) struct RouteErrorPages<'a> {
    pub pages: &'a [ErrorPage],
    pub index: usize,
    /// Resource warnings about these pages are attached to.
    pub owner: ResourceRef,
}

impl RouteErrorPages<'_> {
    /// `error_page` entries as seen from a proxying location.
    pub fn directives(&self) -> Vec<document::ErrorPage> {
        self.pages
            .iter()
            .enumerate()
            .map(|(i, page)| {
                let (name, response_code) = match &page.action {
                    ErrorPageAction::Redirect(redirect) => (
                        redirect.url.clone(),
                        if redirect.code == 0 { 301 } else { redirect.code },
                    ),
                    ErrorPageAction::Return(ret) => (error_page_location(self.index, i), ret.code),
                };
                document::ErrorPage {
                    name,
                    codes: page
                        .codes
                        .iter()
                        .map(u16::to_string)
                        .collect::<Vec<_>>()
                        .join(" "),
                    response_code,
                }
            })
            .collect()
    }

    /// Codes configured for pages that a gRPC upstream would ignore.
    pub fn grpc_conflicts(&self) -> Vec<u16> {
        self.pages
            .iter()
            .flat_map(|page| page.codes.iter().copied())
            .filter(|code| GRPC_CONFLICTING_CODES.contains(code))
            .collect()
    }
}

/// Number of named locations `pages` needs; redirects are handled inline.
pub(crate) fn named_location_count(pages: &[ErrorPage]) -> usize {
    pages
        .iter()
        .filter(|page| matches!(page.action, ErrorPageAction::Return(_)))
        .count()
}

pub(crate) fn error_page_locations(index: usize, pages: &[ErrorPage]) -> Vec<ErrorPageLocation> {
    pages
        .iter()
        .enumerate()
        .filter_map(|(i, page)| match &page.action {
            ErrorPageAction::Redirect(_) => None,
            ErrorPageAction::Return(ret) => Some(ErrorPageLocation {
                name: error_page_location(index, i),
                default_type: if ret.content_type.is_empty() {
                    "text/html".to_string()
                } else {
                    ret.content_type.clone()
                },
                r#return: Return {
                    code: 0,
                    text: ret.body.clone(),
                },
                headers: ret
                    .headers
                    .iter()
                    .map(|h| Header::new(&h.name, &h.value))
                    .collect(),
            }),
        })
        .collect()
}
