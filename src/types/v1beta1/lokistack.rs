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

use crate::types;
use crate::types::error::NoNamespaceSnafu;
use crate::types::v1beta1::k8s::{LokiStackSizeType, ManagementStateType};
use crate::types::v1beta1::limits::LimitsSpec;
use crate::types::v1beta1::storage::ObjectStorageSpec;
use crate::types::v1beta1::template::LokiTemplateSpec;
use crate::types::v1beta1::tenants::TenantsSpec;
use kube::{CustomResource, KubeSchema, ResourceExt};
use serde::{Deserialize, Serialize};
use snafu::OptionExt;

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, PartialEq, KubeSchema)]
#[kube(
    group = "loki.grafana.com",
    version = "v1beta1",
    kind = "LokiStack",
    namespaced,
    status = "crate::types::v1beta1::status::LokiStackStatus",
    shortname = "lokistack",
    plural = "lokistacks",
    singular = "lokistack",
    category = "logging",
    printcolumn = r#"{"name":"Size", "type":"string", "jsonPath":".spec.size"}"#,
    printcolumn = r#"{"name":"Management", "type":"string", "jsonPath":".spec.managementState"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#,
    crates(serde_json = "k8s_openapi::serde_json")
)]
#[serde(rename_all = "camelCase")]
pub struct LokiStackSpec {
    /// Whether the operator reconciles this stack. Defaults to Managed.
    #[serde(default)]
    pub management_state: ManagementStateType,

    pub size: LokiStackSizeType,

    /// Object storage endpoint the logs are persisted to.
    pub storage: ObjectStorageSpec,

    /// Storage class for the ingester and querier PVCs.
    pub storage_class_name: String,

    #[x_kube(validation = Rule::new("self >= 1").message("replicationFactor must be at least 1"))]
    pub replication_factor: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<LimitsSpec>,

    /// Per-component replica and scheduling overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<LokiTemplateSpec>,

    /// Gateway authentication and authorization per tenant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenants: Option<TenantsSpec>,
}

impl LokiStack {
    pub fn namespace(&self) -> Result<String, types::error::Error> {
        ResourceExt::namespace(self).context(NoNamespaceSnafu)
    }

    pub fn name(&self) -> String {
        ResourceExt::name_any(self)
    }

    pub fn is_managed(&self) -> bool {
        self.spec.management_state == ManagementStateType::Managed
    }

    pub fn object_storage_secret_name(&self) -> &str {
        &self.spec.storage.secret.name
    }

    /// `namespace/name`, used as the per-object key in logs.
    pub fn key(&self) -> String {
        format!(
            "{}/{}",
            ResourceExt::namespace(self).unwrap_or_default(),
            self.name()
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::types::v1beta1::limits::LimitsTemplateSpec;
    use crate::types::v1beta1::tenants::ModeType;
    use kube::CustomResourceExt;

    #[test]
    fn test_spec_round_trip() {
        for stack in [
            crate::tests::create_test_lokistack(LokiStackSizeType::OneXSmall, 2),
            crate::tests::create_full_lokistack(),
        ] {
            let json = serde_json::to_string(&stack.spec).unwrap();
            let back: LokiStackSpec = serde_json::from_str(&json).unwrap();
            assert_eq!(back, stack.spec);

            let yaml = serde_yaml_ng::to_string(&stack.spec).unwrap();
            let back: LokiStackSpec = serde_yaml_ng::from_str(&yaml).unwrap();
            assert_eq!(back, stack.spec);
        }
    }

    #[test]
    fn test_optional_sections_keep_presence() {
        let spec = crate::tests::create_full_lokistack().spec;
        let json = serde_json::to_value(&spec).unwrap();

        assert_eq!(json["limits"]["tenants"]["dev"], serde_json::json!({}));
        assert_eq!(json["limits"]["tenants"]["prod"]["ingestion"]["ingestionRate"], 0);
        assert!(json["limits"]["tenants"]["prod"].get("queries").is_none());
        assert_eq!(json["template"]["gateway"], serde_json::json!({}));
        assert!(json["template"].get("querier").is_none());
        assert_eq!(
            json["template"]["ingester"]["tolerations"][0]["effect"],
            "NoSchedule"
        );
        assert!(json["tenants"]["authorization"]["opa"]["url"].is_string());

        let back: LokiStackSpec = serde_json::from_value(json).unwrap();
        let limits = back.limits.unwrap();
        assert_eq!(limits.tenants["dev"], LimitsTemplateSpec::default());
        assert_eq!(
            limits.tenants["prod"].ingestion_limits.as_ref().unwrap().ingestion_rate,
            Some(0)
        );
        assert_eq!(back.template.unwrap().gateway, Some(Default::default()));
    }

    #[test]
    fn test_defaults_applied_on_minimal_spec() {
        let spec: LokiStackSpec = serde_yaml_ng::from_str(
            r#"
size: 1x.extra-small
storage:
  secret:
    name: loki-s3
storageClassName: gp2
replicationFactor: 1
tenants: {}
"#,
        )
        .unwrap();

        assert_eq!(spec.management_state, ManagementStateType::Managed);
        assert_eq!(spec.tenants.unwrap().mode, ModeType::OpenshiftLogging);
        assert!(spec.limits.is_none());
    }

    #[test]
    fn test_unknown_size_rejected_at_deserialization() {
        let res: Result<LokiStackSpec, _> = serde_json::from_str(
            r#"{"size":"1x.huge","storage":{"secret":{"name":"s"}},"storageClassName":"gp2","replicationFactor":1}"#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_namespace_required() {
        let mut stack = crate::tests::create_test_lokistack(LokiStackSizeType::OneXSmall, 1);
        assert_eq!(stack.namespace().unwrap(), "openshift-logging");
        assert_eq!(stack.key(), "openshift-logging/lokistack-dev");

        stack.metadata.namespace = None;
        assert!(stack.namespace().is_err());
    }

    #[test]
    fn test_crd_metadata() {
        let crd = LokiStack::crd();
        assert_eq!(crd.spec.group, "loki.grafana.com");
        assert_eq!(crd.spec.names.kind, "LokiStack");
        assert_eq!(crd.spec.names.plural, "lokistacks");
        assert_eq!(
            crd.spec.names.categories,
            Some(vec!["logging".to_string()])
        );
        assert_eq!(crd.spec.versions[0].name, "v1beta1");
    }
}
