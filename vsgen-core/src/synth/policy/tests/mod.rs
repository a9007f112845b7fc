mod auth_tests;

use crate::conf::types::{
    ObjectMeta, Policy, PolicyKind, PolicyReference, ResourceKind, ResourceRef,
};
use crate::synth::lookup::{
    BundleError, BundleValidator, PolicyCatalog, SecretReference, SecretStore, WafResources,
};
use crate::synth::policy::{
    OidcBinding, PolicyContext, PolicyOptions, PolicyOutcome, PolicyOwner, PolicyResolver,
};
use crate::synth::report::SynthesisReport;

/// Accepts every bundle under `/bundles`.
pub(crate) struct AcceptAllBundles;

impl BundleValidator for AcceptAllBundles {
    fn validate(&self, bundle: &str) -> Result<String, BundleError> {
        Ok(format!("/bundles/{bundle}"))
    }
}

pub(crate) fn policy(name: &str, spec: PolicyKind) -> Policy {
    Policy {
        metadata: ObjectMeta::new("default", name),
        spec,
    }
}

pub(crate) fn reference(name: &str) -> PolicyReference {
    PolicyReference {
        name: name.to_string(),
        namespace: String::new(),
    }
}

pub(crate) fn secret(secret_type: &str, path: &str) -> SecretReference {
    SecretReference {
        secret_type: secret_type.to_string(),
        path: path.to_string(),
        ..SecretReference::default()
    }
}

/// Everything a resolver needs, owned so tests can tweak one piece at a time.
pub(crate) struct Fixture {
    pub vs: ObjectMeta,
    pub owner: ResourceRef,
    pub catalog: PolicyCatalog,
    pub secrets: SecretStore,
    pub waf: WafResources,
    pub tls: bool,
    pub replicas: u32,
}

impl Fixture {
    pub fn new(policies: Vec<Policy>) -> Self {
        let vs = ObjectMeta::new("default", "cafe");
        Self {
            owner: ResourceRef::new(ResourceKind::VirtualServer, &vs),
            vs,
            catalog: policies.into_iter().map(|p| (p.key(), p)).collect(),
            secrets: SecretStore::new(),
            waf: WafResources::default(),
            tls: true,
            replicas: 1,
        }
    }

    pub fn with_secret(mut self, key: &str, secret: SecretReference) -> Self {
        self.secrets.insert(key.to_string(), secret);
        self
    }

    pub fn resolve(
        &self,
        refs: &[PolicyReference],
        context: PolicyContext,
        oidc: &mut Option<OidcBinding>,
    ) -> (PolicyOutcome, SynthesisReport) {
        let options = PolicyOptions {
            tls: self.tls,
            zone_sync: false,
            replicas: self.replicas,
            secrets: &self.secrets,
            waf: &self.waf,
            bundles: &AcceptAllBundles,
            log_output: "syslog:server=localhost:514",
        };
        let resolver = PolicyResolver::new(&self.catalog, options);
        let owner = PolicyOwner {
            resource: &self.owner,
            vs: &self.vs,
        };

        let mut report = SynthesisReport::default();
        let outcome = resolver.resolve(owner, refs, context, "/", oidc, &mut report);
        (outcome, report)
    }

    pub fn resolve_spec(&self, refs: &[PolicyReference]) -> (PolicyOutcome, SynthesisReport) {
        self.resolve(refs, PolicyContext::Spec, &mut None)
    }
}
