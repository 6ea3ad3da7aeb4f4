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
use crate::types::v1beta1::limits::{LimitsSpec, LimitsTemplateSpec};
use crate::types::v1beta1::tenants::TenantsSpec;
use tracing::warn;

const LIMITS_PATH: &str = "spec.limits";

/// Collects every offending limit field.
///
/// Each template (global and every tenant entry) is checked on its own for negative
/// values. The rate/burst dependency is checked on the effective values, so a tenant
/// that only raises `ingestionRate` inherits the global `ingestionBurstSize`.
/// When `tenants` is given, per-tenant keys must name a declared tenant.
pub fn limit_violations(limits: &LimitsSpec, tenants: Option<&TenantsSpec>) -> Vec<Violation> {
    let mut violations = Vec::new();

    let global = limits.global.clone().unwrap_or_default();
    let global_path = format!("{LIMITS_PATH}.global");
    check_non_negative(&global_path, &global, &mut violations);
    check_rate_and_burst(&global_path, &global, &mut violations);

    let declared = tenants.map(TenantsSpec::tenant_names);

    for (tenant, template) in &limits.tenants {
        let path = format!("{LIMITS_PATH}.tenants.{tenant}");

        if tenant.is_empty() {
            violations.push(Violation::new(&path, "tenant name must not be empty"));
        } else if let Some(declared) = &declared
            && !declared.contains(&tenant.as_str())
        {
            violations.push(Violation::new(
                &path,
                format!("tenant '{tenant}' is not declared in spec.tenants"),
            ));
        }

        check_non_negative(&path, template, &mut violations);
        check_rate_and_burst(&path, &template.overlay(&global), &mut violations);
    }

    violations
}

/// Fails with `InvalidLimitsConfiguration` listing every offending field.
pub fn validate_limits(limits: &LimitsSpec, tenants: Option<&TenantsSpec>) -> Result<(), Error> {
    let violations = limit_violations(limits, tenants);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(Error::InvalidLimitsConfiguration { violations })
    }
}

fn check_non_negative(path: &str, template: &LimitsTemplateSpec, out: &mut Vec<Violation>) {
    let ingestion = template
        .ingestion_limits
        .iter()
        .flat_map(|l| l.fields())
        .map(|(name, value)| (format!("{path}.ingestion.{name}"), value));
    let queries = template
        .query_limits
        .iter()
        .flat_map(|l| l.fields())
        .map(|(name, value)| (format!("{path}.queries.{name}"), value));

    for (field, value) in ingestion.chain(queries) {
        if let Some(v) = value
            && v < 0
        {
            out.push(Violation::new(field, format!("must be non-negative, got {v}")));
        }
    }
}

fn check_rate_and_burst(path: &str, template: &LimitsTemplateSpec, out: &mut Vec<Violation>) {
    let Some(ingestion) = &template.ingestion_limits else {
        return;
    };
    let rate = ingestion.ingestion_rate.unwrap_or(0);
    let burst = ingestion.ingestion_burst_size.unwrap_or(0);

    if rate > 0 && burst <= 0 {
        out.push(Violation::new(
            format!("{path}.ingestion.ingestionBurstSize"),
            format!("must be greater than 0 when ingestionRate is set (ingestionRate={rate})"),
        ));
    } else if burst > 0 && burst < rate {
        warn!(
            path,
            rate, burst, "ingestion burst size is below the ingestion rate"
        );
    }
}
