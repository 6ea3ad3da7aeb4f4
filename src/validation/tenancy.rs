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

use super::{Error, Violation};
use crate::types::v1beta1::tenants::{
    AuthenticationSpec, AuthorizationSpec, ModeType, RoleBindingsSpec, TenantsSpec,
};
use std::collections::HashSet;

const TENANTS_PATH: &str = "spec.tenants";

/// Checks the mode-specific requirements of a gateway tenancy spec.
///
/// - static: roles and role bindings required, every bound role declared
/// - dynamic: `authorization.opa.url` required and must be an http(s) URL
/// - openshift-logging: no manual authentication or authorization allowed
///
/// Authentication entries of static and dynamic modes must be complete and
/// carry unique tenant names.
pub fn validate_tenancy(spec: &TenantsSpec) -> Result<(), Error> {
    let mut violations = Vec::new();

    match spec.mode {
        ModeType::Static => {
            check_authentication(&spec.authentication, &mut violations);
            check_static_authorization(spec, &mut violations);
        }
        ModeType::Dynamic => {
            check_authentication(&spec.authentication, &mut violations);
            check_dynamic_authorization(spec.authorization.as_ref(), &mut violations);
        }
        ModeType::OpenshiftLogging => {
            if !spec.authentication.is_empty() {
                violations.push(Violation::new(
                    format!("{TENANTS_PATH}.authentication"),
                    "must be empty in openshift-logging mode",
                ));
            }
            if spec
                .authorization
                .as_ref()
                .is_some_and(|a| *a != AuthorizationSpec::default())
            {
                violations.push(Violation::new(
                    format!("{TENANTS_PATH}.authorization"),
                    "must be empty in openshift-logging mode",
                ));
            }
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(Error::InvalidTenantsConfiguration { violations })
    }
}

/// Syntactic http(s) URL check: scheme and host must be present.
pub(crate) fn is_http_url(raw: &str) -> bool {
    let Ok(uri) = raw.parse::<http::Uri>() else {
        return false;
    };
    let scheme_ok = matches!(uri.scheme_str(), Some("http" | "https"));
    let host_ok = uri.host().is_some_and(|h| !h.is_empty());
    scheme_ok && host_ok
}

fn check_authentication(authentication: &[AuthenticationSpec], out: &mut Vec<Violation>) {
    let path = format!("{TENANTS_PATH}.authentication");
    if authentication.is_empty() {
        out.push(Violation::new(&path, "at least one tenant is required"));
        return;
    }

    let mut seen = HashSet::new();
    for (i, auth) in authentication.iter().enumerate() {
        let entry = format!("{path}[{i}]");

        if auth.tenant_name.is_empty() {
            out.push(Violation::new(format!("{entry}.tenantName"), "must not be empty"));
        } else if !seen.insert(auth.tenant_name.as_str()) {
            out.push(Violation::new(
                format!("{entry}.tenantName"),
                format!("duplicate tenant name '{}'", auth.tenant_name),
            ));
        }
        if auth.tenant_id.is_empty() {
            out.push(Violation::new(format!("{entry}.tenantId"), "must not be empty"));
        }

        let Some(oidc) = &auth.oidc else {
            out.push(Violation::new(format!("{entry}.oidc"), "is required"));
            continue;
        };
        if oidc.secret.as_ref().is_none_or(|s| s.name.is_empty()) {
            out.push(Violation::new(
                format!("{entry}.oidc.secret.name"),
                "must not be empty",
            ));
        }
        if !is_http_url(&oidc.issuer_url) {
            out.push(Violation::new(
                format!("{entry}.oidc.issuerURL"),
                format!("'{}' is not a valid http(s) URL", oidc.issuer_url),
            ));
        }
    }
}

fn check_static_authorization(spec: &TenantsSpec, out: &mut Vec<Violation>) {
    let path = format!("{TENANTS_PATH}.authorization");
    let Some(authz) = &spec.authorization else {
        out.push(Violation::new(&path, "roles and roleBindings are required in static mode"));
        return;
    };

    if authz.roles.is_empty() {
        out.push(Violation::new(format!("{path}.roles"), "must not be empty in static mode"));
    }
    if authz.role_bindings.is_empty() {
        out.push(Violation::new(
            format!("{path}.roleBindings"),
            "must not be empty in static mode",
        ));
    }

    let tenants: HashSet<&str> = spec
        .authentication
        .iter()
        .map(|a| a.tenant_name.as_str())
        .collect();
    let mut roles = HashSet::new();
    for (i, role) in authz.roles.iter().enumerate() {
        let entry = format!("{path}.roles[{i}]");
        if role.name.is_empty() {
            out.push(Violation::new(format!("{entry}.name"), "must not be empty"));
        } else if !roles.insert(role.name.as_str()) {
            out.push(Violation::new(
                format!("{entry}.name"),
                format!("duplicate role name '{}'", role.name),
            ));
        }
        for tenant in role.tenants.iter().filter(|t| !tenants.contains(t.as_str())) {
            out.push(Violation::new(
                format!("{entry}.tenants"),
                format!("tenant '{tenant}' is not declared in authentication"),
            ));
        }
    }

    for (i, binding) in authz.role_bindings.iter().enumerate() {
        check_role_binding(&format!("{path}.roleBindings[{i}]"), binding, &roles, out);
    }
}

fn check_role_binding(
    entry: &str,
    binding: &RoleBindingsSpec,
    roles: &HashSet<&str>,
    out: &mut Vec<Violation>,
) {
    if binding.name.is_empty() {
        out.push(Violation::new(format!("{entry}.name"), "must not be empty"));
    }
    if binding.roles.is_empty() {
        out.push(Violation::new(format!("{entry}.roles"), "must not be empty"));
    }
    for role in binding.roles.iter().filter(|r| !roles.contains(r.as_str())) {
        out.push(Violation::new(
            format!("{entry}.roles"),
            format!("role '{role}' is not declared in authorization.roles"),
        ));
    }
    if binding.subjects.is_empty() {
        out.push(Violation::new(format!("{entry}.subjects"), "must not be empty"));
    }
    for (j, subject) in binding.subjects.iter().enumerate() {
        if subject.name.trim().is_empty() {
            out.push(Violation::new(
                format!("{entry}.subjects[{j}].name"),
                "must not be empty",
            ));
        }
    }
}

fn check_dynamic_authorization(authz: Option<&AuthorizationSpec>, out: &mut Vec<Violation>) {
    let path = format!("{TENANTS_PATH}.authorization.opa.url");
    match authz.and_then(|a| a.opa.as_ref()).map(|o| o.url.as_str()) {
        None | Some("") => out.push(Violation::new(path, "is required in dynamic mode")),
        Some(url) if !is_http_url(url) => out.push(Violation::new(
            path,
            format!("'{url}' is not a valid http(s) URL"),
        )),
        Some(_) => {}
    }
}
