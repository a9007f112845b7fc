//! Compiles route actions, splits and matches into locations and the maps
//! that select between them.

mod matches;
mod splits;

#[cfg(test)]
mod tests;

use crate::conf::types::{Action, ObjectMeta, ResourceRef, Split, Upstream};
use crate::document::{self, InternalRedirectLocation};
use crate::synth::ctx::Pass;
use crate::synth::error_pages::RouteErrorPages;
use crate::synth::location::{
    LocationSite, ProxyTarget, proxy_location, redirect_location, return_location_pair,
};
use crate::synth::naming::UpstreamNamer;

/// What every location compiled from one route shares.
pub(crate) struct RouteScope<'a> {
    /// Owner of policy and routing warnings for the route.
    pub owner: ResourceRef,
    pub upstream_namer: &'a UpstreamNamer,
    pub vsr: Option<&'a ObjectMeta>,
    pub path: &'a str,
    pub snippets: Vec<String>,
    pub error_pages: RouteErrorPages<'a>,
    error_directives: Vec<document::ErrorPage>,
}

impl<'a> RouteScope<'a> {
    pub fn new(
        owner: ResourceRef,
        upstream_namer: &'a UpstreamNamer,
        vsr: Option<&'a ObjectMeta>,
        path: &'a str,
        snippets: Vec<String>,
        error_pages: RouteErrorPages<'a>,
    ) -> Self {
        let error_directives = error_pages.directives();
        Self {
            owner,
            upstream_namer,
            vsr,
            path,
            snippets,
            error_pages,
            error_directives,
        }
    }
}

impl Pass<'_> {
    /// A route with a single action is served from its own path.
    pub(crate) fn compile_action_route(&mut self, scope: &RouteScope<'_>, action: &Action) {
        self.action_location(scope, scope.path, false, action);
    }

    pub(crate) fn compile_splits_route(&mut self, scope: &RouteScope<'_>, splits: &[Split]) {
        let index = self.reserve_splits(splits);
        let destination = self.splits_destination(index, splits);
        self.compile_splits(scope, splits, index);
        self.out.internal_redirects.push(InternalRedirectLocation {
            path: scope.path.to_string(),
            destination,
        });
    }

    /// Emits the location for one leaf action, plus its return location if any.
    pub(crate) fn action_location(
        &mut self,
        scope: &RouteScope<'_>,
        path: &str,
        internal: bool,
        action: &Action,
    ) {
        match action {
            Action::Redirect(redirect) => {
                let location = redirect_location(path, &scope.snippets, redirect);
                self.out.locations.push(location);
            }
            Action::Return(ret) => {
                let index = self.indices.next_return_location();
                let (location, return_location) =
                    return_location_pair(path, &scope.snippets, ret, index);
                self.out.locations.push(location);
                self.out.return_locations.push(return_location);
            }
            Action::Pass(_) | Action::Proxy(_) => {
                let name = scope.upstream_namer.upstream_for_action(action);
                let fallback = Upstream::default();
                let (upstream, tls) = match self.upstreams.get(&name) {
                    Some(registered) => (registered.upstream, registered.tls),
                    None => {
                        tracing::debug!(
                            upstream = %name,
                            path,
                            "action references an undeclared upstream"
                        );
                        (&fallback, false)
                    }
                };

                if upstream.is_grpc() {
                    let codes = scope.error_pages.grpc_conflicts();
                    if !codes.is_empty() {
                        self.report.grpc_error_pages_ignored(
                            &scope.error_pages.owner,
                            &upstream.name,
                            &codes,
                        );
                    }
                }

                let proxy_ssl_name = format!(
                    "{}.{}.svc",
                    upstream.service,
                    scope.upstream_namer.namespace()
                );
                let site = LocationSite {
                    path,
                    original_path: scope.path,
                    internal,
                    snippets: &scope.snippets,
                    error_pages: &scope.error_directives,
                    vsr: scope.vsr,
                };
                let target = ProxyTarget {
                    name: &name,
                    upstream,
                    tls,
                    proxy_ssl_name: &proxy_ssl_name,
                };
                let location = proxy_location(&site, &target, action.proxy(), self.params);
                self.out.locations.push(location);
            }
        }
    }
}
