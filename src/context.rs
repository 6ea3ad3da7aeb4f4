// Copyright 2025 The LokiStack Operator Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, ApiResource, DynamicObject, GroupVersionKind};
use snafu::futures::TryFutureExt;
use snafu::{OptionExt, Snafu};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

const DNS_GROUP: &str = "config.openshift.io";
const DNS_VERSION: &str = "v1";
const DNS_KIND: &str = "DNS";
const DNS_PLURAL: &str = "dnses";
const DNS_CLUSTER_NAME: &str = "cluster";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Kubernetes API error: {}", source))]
    Kube { source: kube::Error },

    #[snafu(display("secret '{}' not found in namespace '{}'", name, namespace))]
    SecretNotFound { namespace: String, name: String },

    #[snafu(display("cluster DNS config '{}' has no spec.baseDomain", DNS_CLUSTER_NAME))]
    MissingBaseDomain,

    #[snafu(display("base domain lookup timed out after {:?}", timeout))]
    LookupTimeout { timeout: Duration },
}

/// Existence check for secrets referenced by name. Secret contents are never read.
pub trait SecretChecker {
    fn secret_exists(
        &self,
        namespace: &str,
        name: &str,
    ) -> impl Future<Output = Result<bool, Error>> + Send;
}

/// Lookup of the platform DNS base domain used by the openshift-logging gateway.
pub trait BaseDomainProvider {
    fn base_domain(&self) -> impl Future<Output = Result<String, Error>> + Send;
}

/// Fails with `SecretNotFound` when the secret does not exist.
pub async fn require_secret<C>(checker: &C, namespace: &str, name: &str) -> Result<(), Error>
where
    C: SecretChecker + Sync,
{
    if checker.secret_exists(namespace, name).await? {
        Ok(())
    } else {
        SecretNotFoundSnafu { namespace, name }.fail()
    }
}

/// Kubernetes-backed collaborators.
pub struct Context {
    pub(crate) client: kube::Client,
}

impl Context {
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }
}

impl SecretChecker for Context {
    async fn secret_exists(&self, namespace: &str, name: &str) -> Result<bool, Error> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let meta = api.get_metadata_opt(name).context(KubeSnafu).await?;
        debug!(namespace, name, found = meta.is_some(), "secret lookup");
        Ok(meta.is_some())
    }
}

impl BaseDomainProvider for Context {
    async fn base_domain(&self) -> Result<String, Error> {
        let gvk = GroupVersionKind::gvk(DNS_GROUP, DNS_VERSION, DNS_KIND);
        let resource = ApiResource::from_gvk_with_plural(&gvk, DNS_PLURAL);
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &resource);

        let dns = api.get(DNS_CLUSTER_NAME).context(KubeSnafu).await?;
        dns.data
            .get("spec")
            .and_then(|spec| spec.get("baseDomain"))
            .and_then(|domain| domain.as_str())
            .filter(|domain| !domain.is_empty())
            .map(str::to_owned)
            .context(MissingBaseDomainSnafu)
    }
}

/// Collaborators for evaluating a LokiStack without a cluster: every secret is
/// assumed present and the base domain is fixed.
#[derive(Debug, Clone, Default)]
pub struct Offline {
    pub base_domain: Option<String>,
}

impl SecretChecker for Offline {
    async fn secret_exists(&self, _namespace: &str, _name: &str) -> Result<bool, Error> {
        Ok(true)
    }
}

impl BaseDomainProvider for Offline {
    async fn base_domain(&self) -> Result<String, Error> {
        self.base_domain.clone().context(MissingBaseDomainSnafu)
    }
}
