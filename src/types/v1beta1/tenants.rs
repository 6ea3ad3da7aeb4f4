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

//! Gateway tenancy: authentication per tenant and authorization rules

use k8s_openapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Tenants provisioned automatically in `openshift-logging` mode.
pub const OPENSHIFT_LOGGING_TENANTS: [&str; 3] = ["application", "infrastructure", "audit"];

/// Kind of a gateway RBAC subject.
#[derive(
    Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SubjectKind {
    User,
    Group,
}

/// A subject bound to a set of roles.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub name: String,
    pub kind: SubjectKind,
}

/// Binds a set of roles to a set of subjects.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleBindingsSpec {
    pub name: String,
    pub subjects: Vec<Subject>,
    pub roles: Vec<String>,
}

/// Gateway RBAC permission on a tenant.
#[derive(
    Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PermissionType {
    Read,
    Write,
}

/// A set of permissions to interact with a tenant.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleSpec {
    pub name: String,
    pub resources: Vec<String>,
    pub tenants: Vec<String>,
    pub permissions: Vec<PermissionType>,
}

/// Third-party OPA-compatible authorization endpoint.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OPASpec {
    pub url: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opa: Option<OPASpec>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<RoleSpec>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub role_bindings: Vec<RoleBindingsSpec>,
}

/// Secret reference by name, resolved in the LokiStack namespace.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TenantSecretSpec {
    pub name: String,
}

/// OIDC settings of a single tenant. The secret holds clientID, clientSecret and issuerCAPath.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OIDCSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<TenantSecretSpec>,

    #[serde(rename = "issuerURL", default)]
    pub issuer_url: String,

    #[serde(rename = "redirectURL", default)]
    pub redirect_url: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group_claim: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username_claim: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationSpec {
    pub tenant_name: String,

    #[serde(rename = "tenantId")]
    pub tenant_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oidc: Option<OIDCSpec>,
}

/// Mode the gateway runs its authentication and authorization in.
/// - static: roles and role bindings evaluated by an in-process Rego authorizer
/// - dynamic: authorization delegated to a third-party OPA endpoint
/// - openshift-logging: in-cluster OpenShift authentication and authorization (default)
#[derive(
    Default,
    Deserialize,
    Serialize,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    JsonSchema,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ModeType {
    Static,
    Dynamic,
    #[default]
    OpenshiftLogging,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TenantsSpec {
    #[serde(default)]
    pub mode: ModeType,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authentication: Vec<AuthenticationSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<AuthorizationSpec>,
}

impl TenantsSpec {
    /// Tenant names this spec declares, in declaration order.
    pub fn tenant_names(&self) -> Vec<&str> {
        match self.mode {
            ModeType::OpenshiftLogging => OPENSHIFT_LOGGING_TENANTS.to_vec(),
            ModeType::Static | ModeType::Dynamic => self
                .authentication
                .iter()
                .map(|a| a.tenant_name.as_str())
                .collect(),
        }
    }

    /// Names of the OIDC secrets referenced by the authentication entries.
    pub fn tenant_secret_names(&self) -> Vec<&str> {
        self.authentication
            .iter()
            .filter_map(|a| a.oidc.as_ref()?.secret.as_ref())
            .map(|s| s.name.as_str())
            .filter(|n| !n.is_empty())
            .collect()
    }
}
