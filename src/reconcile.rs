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

pub mod conditions;

use crate::context::{self, BaseDomainProvider, SecretChecker, require_secret};
use crate::error_policy::error_policy;
use crate::types::v1beta1::lokistack::LokiStack;
use crate::types::v1beta1::status::{
    LokiStackComponentStatus, LokiStackConditionReason, LokiStackStatus, ReportedDegradation,
};
use crate::types::v1beta1::tenants::{AuthorizationSpec, ModeType, TenantsSpec};
use crate::{types, validation};
use chrono::{DateTime, Utc};
use conditions::{Degradation, aggregate};
use futures::future::try_join_all;
use kube::runtime::controller::Action;
use snafu::{ResultExt, Snafu};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Upper bound for the OpenShift base domain lookup.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Snafu, Debug)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(transparent)]
    Validation { source: validation::Error },

    #[snafu(transparent)]
    Types { source: types::error::Error },

    #[snafu(display("object storage secret check failed: {}", source))]
    ObjectStorageSecret { source: context::Error },

    #[snafu(display("gateway tenant secret check failed: {}", source))]
    TenantSecret { source: context::Error },

    #[snafu(display("OpenShift base domain lookup failed: {}", source))]
    BaseDomain { source: context::Error },
}

impl Error {
    pub fn reason(&self) -> LokiStackConditionReason {
        match self {
            Error::Validation { source } => source.reason(),
            // secrets are looked up in the stack namespace
            Error::Types { .. } | Error::ObjectStorageSecret { .. } => {
                LokiStackConditionReason::MissingObjectStorageSecret
            }
            Error::TenantSecret { .. } => LokiStackConditionReason::MissingGatewayTenantSecret,
            Error::BaseDomain { .. } => {
                LokiStackConditionReason::MissingGatewayOpenShiftBaseDomain
            }
        }
    }

    /// Spec errors only go away when the user edits the object.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }
}

/// Gateway tenancy after mode checks and external lookups.
#[derive(Clone, Debug, PartialEq)]
pub enum ResolvedTenancy {
    Static {
        tenants: Vec<String>,
        authorization: AuthorizationSpec,
    },
    Dynamic {
        tenants: Vec<String>,
        opa_url: String,
    },
    OpenshiftLogging {
        tenants: Vec<String>,
        base_domain: String,
    },
}

impl ResolvedTenancy {
    pub fn mode(&self) -> ModeType {
        match self {
            ResolvedTenancy::Static { .. } => ModeType::Static,
            ResolvedTenancy::Dynamic { .. } => ModeType::Dynamic,
            ResolvedTenancy::OpenshiftLogging { .. } => ModeType::OpenshiftLogging,
        }
    }

    pub fn tenants(&self) -> &[String] {
        match self {
            ResolvedTenancy::Static { tenants, .. }
            | ResolvedTenancy::Dynamic { tenants, .. }
            | ResolvedTenancy::OpenshiftLogging { tenants, .. } => tenants,
        }
    }
}

/// Validates `spec` for its mode and, in openshift-logging mode, looks up the
/// platform base domain. The lookup fails closed after `lookup_timeout`.
pub async fn resolve_tenancy<P>(
    spec: &TenantsSpec,
    provider: &P,
    lookup_timeout: Duration,
) -> Result<ResolvedTenancy, Error>
where
    P: BaseDomainProvider + Sync,
{
    validation::validate_tenancy(spec)?;

    let tenants = spec.tenant_names().into_iter().map(str::to_owned).collect();
    let resolved = match spec.mode {
        ModeType::Static => ResolvedTenancy::Static {
            tenants,
            authorization: spec.authorization.clone().unwrap_or_default(),
        },
        ModeType::Dynamic => ResolvedTenancy::Dynamic {
            tenants,
            opa_url: spec
                .authorization
                .as_ref()
                .and_then(|a| a.opa.as_ref())
                .map(|o| o.url.clone())
                .unwrap_or_default(),
        },
        ModeType::OpenshiftLogging => {
            let base_domain = tokio::time::timeout(lookup_timeout, provider.base_domain())
                .await
                .unwrap_or_else(|_| {
                    context::LookupTimeoutSnafu {
                        timeout: lookup_timeout,
                    }
                    .fail()
                })
                .context(BaseDomainSnafu)?;
            ResolvedTenancy::OpenshiftLogging {
                tenants,
                base_domain,
            }
        }
    };

    Ok(resolved)
}

/// Live state gathered by the caller for one pass.
#[derive(Clone, Debug, Default)]
pub struct Observed {
    pub components: LokiStackComponentStatus,
    /// Degradation detected outside this pass, `None` when nothing new is known.
    pub degradation: Option<Degradation>,
}

#[derive(Debug)]
pub struct PassOutcome {
    pub status: LokiStackStatus,
    pub tenancy: Option<ResolvedTenancy>,
    pub error: Option<Error>,
    pub action: Action,
}

/// Runs the checks of one reconciliation pass, in order: limits, replication,
/// object storage secret, tenant secrets, tenancy. Stops at the first failure.
pub async fn check_lokistack<C>(
    stack: &LokiStack,
    ctx: &C,
    lookup_timeout: Duration,
) -> Result<Option<ResolvedTenancy>, Error>
where
    C: SecretChecker + BaseDomainProvider + Sync,
{
    let spec = &stack.spec;

    if let Some(limits) = &spec.limits {
        validation::validate_limits(limits, spec.tenants.as_ref())?;
    }
    validation::validate_replication(spec.size, spec.replication_factor)?;

    let namespace = stack.namespace()?;
    require_secret(ctx, &namespace, stack.object_storage_secret_name())
        .await
        .context(ObjectStorageSecretSnafu)?;

    let Some(tenants) = &spec.tenants else {
        return Ok(None);
    };

    if tenants.mode != ModeType::OpenshiftLogging {
        let checks = tenants
            .tenant_secret_names()
            .into_iter()
            .map(|name| require_secret(ctx, &namespace, name));
        try_join_all(checks).await.context(TenantSecretSnafu)?;
    }

    resolve_tenancy(tenants, ctx, lookup_timeout).await.map(Some)
}

/// Applies an external signal to the standing reported degradation: a new report
/// replaces it, a clear drops it, no signal keeps it.
fn reported_degradation(
    previous: Option<&LokiStackStatus>,
    signal: Option<&Degradation>,
) -> Option<ReportedDegradation> {
    match signal {
        Some(Degradation::Detected { reason, message }) => Some(ReportedDegradation {
            reason: *reason,
            message: message.clone(),
        }),
        Some(Degradation::Cleared) => None,
        None => previous.and_then(|s| s.reported_degradation.clone()),
    }
}

/// Evaluates one reconciliation pass for `stack` and computes its next status.
///
/// Returns `None` for an unmanaged stack: nothing is checked and the status is
/// left as is. Failures never abort the pass; they surface as a Degraded
/// condition carrying the failure reason, and the component status is always
/// taken from `observed`. A failing check shadows a reported degradation
/// without dropping it. `attempts` counts the consecutive failed passes.
pub async fn reconcile_lokistack<C>(
    stack: &LokiStack,
    observed: Observed,
    ctx: &C,
    lookup_timeout: Duration,
    attempts: u32,
    now: DateTime<Utc>,
) -> Option<PassOutcome>
where
    C: SecretChecker + BaseDomainProvider + Sync,
{
    if !stack.is_managed() {
        debug!(lokistack = %stack.key(), "lokistack is unmanaged, skipping");
        return None;
    }

    let previous = stack
        .status
        .as_ref()
        .map(|s| s.conditions.as_slice())
        .unwrap_or_default();

    let reported = reported_degradation(stack.status.as_ref(), observed.degradation.as_ref());

    let (tenancy, error, degradation) = match check_lokistack(stack, ctx, lookup_timeout).await {
        Ok(tenancy) => {
            let degradation = match &reported {
                Some(r) => Degradation::Detected {
                    reason: r.reason,
                    message: r.message.clone(),
                },
                None => Degradation::Cleared,
            };
            (tenancy, None, degradation)
        }
        Err(err) => {
            warn!(lokistack = %stack.key(), reason = %err.reason(), "lokistack check failed: {}", err);
            let degradation = Degradation::Detected {
                reason: err.reason(),
                message: err.to_string(),
            };
            (None, Some(err), degradation)
        }
    };

    let conditions = aggregate(
        &observed.components,
        Some(&degradation),
        previous,
        stack.metadata.generation,
        now,
    );
    let action = match &error {
        Some(err) => error_policy(err, attempts),
        None => Action::await_change(),
    };

    info!(
        lokistack = %stack.key(),
        conditions = ?conditions.iter().map(|c| c.type_).collect::<Vec<_>>(),
        "reconciliation pass evaluated"
    );

    Some(PassOutcome {
        status: LokiStackStatus {
            components: observed.components,
            conditions,
            reported_degradation: reported,
        },
        tenancy,
        error,
        action,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::context::Offline;
    use crate::tests::{
        create_component_status, create_dynamic_tenants, create_static_tenants,
        create_test_lokistack,
    };
    use crate::types::v1beta1::k8s::{LokiStackSizeType, ManagementStateType, PodPhase};
    use crate::types::v1beta1::status::LokiStackConditionType;
    use crate::types::v1beta1::limits::{IngestionLimitSpec, LimitsSpec, LimitsTemplateSpec};
    use chrono::TimeZone;
    use std::collections::HashSet;
    use std::future::Future;

    /// Secrets present by name, base domain fixed or hanging forever.
    struct FakeCluster {
        secrets: HashSet<String>,
        base_domain: Option<String>,
    }

    impl FakeCluster {
        fn with_secrets(names: &[&str]) -> Self {
            Self {
                secrets: names.iter().map(|n| n.to_string()).collect(),
                base_domain: Some("apps.example.com".to_string()),
            }
        }
    }

    impl SecretChecker for FakeCluster {
        async fn secret_exists(&self, _namespace: &str, name: &str) -> Result<bool, context::Error> {
            Ok(self.secrets.contains(name))
        }
    }

    impl BaseDomainProvider for FakeCluster {
        fn base_domain(&self) -> impl Future<Output = Result<String, context::Error>> + Send {
            let domain = self.base_domain.clone();
            async move {
                match domain {
                    Some(d) => Ok(d),
                    None => std::future::pending().await,
                }
            }
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn ready() -> Observed {
        Observed {
            components: create_component_status(&[(PodPhase::Running, 1)]),
            degradation: None,
        }
    }

    async fn run(stack: &LokiStack, ctx: &FakeCluster) -> PassOutcome {
        reconcile_lokistack(stack, ready(), ctx, DEFAULT_LOOKUP_TIMEOUT, 0, now())
            .await
            .unwrap()
    }

    fn degraded_reason(outcome: &PassOutcome) -> Option<LokiStackConditionReason> {
        outcome
            .status
            .condition(LokiStackConditionType::Degraded)
            .map(|c| c.reason)
    }

    #[tokio::test]
    async fn test_valid_stack_is_ready() {
        let stack = create_test_lokistack(LokiStackSizeType::OneXMedium, 3);
        let outcome = run(&stack, &FakeCluster::with_secrets(&["test-s3"])).await;

        assert!(outcome.error.is_none());
        assert_eq!(outcome.action, Action::await_change());
        assert_eq!(outcome.status.conditions.len(), 1);
        assert!(outcome.status.condition(LokiStackConditionType::Ready).is_some());
        assert_eq!(outcome.status.components, ready().components);
    }

    #[tokio::test]
    async fn test_unmanaged_stack_is_skipped() {
        let mut stack = create_test_lokistack(LokiStackSizeType::OneXSmall, 9);
        stack.spec.management_state = ManagementStateType::Unmanaged;
        let outcome =
            reconcile_lokistack(&stack, ready(), &FakeCluster::with_secrets(&[]), DEFAULT_LOOKUP_TIMEOUT, 0, now())
                .await;
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn test_invalid_replication_degrades_and_awaits_change() {
        let stack = create_test_lokistack(LokiStackSizeType::OneXSmall, 3);
        let outcome = run(&stack, &FakeCluster::with_secrets(&["test-s3"])).await;

        assert_eq!(
            degraded_reason(&outcome),
            Some(LokiStackConditionReason::InvalidReplicationConfiguration)
        );
        let degraded = outcome
            .status
            .condition(LokiStackConditionType::Degraded)
            .unwrap();
        assert!(degraded.message.contains("max=2"), "{}", degraded.message);
        assert_eq!(outcome.action, Action::await_change());
    }

    #[tokio::test]
    async fn test_limits_checked_before_replication() {
        let mut stack = create_test_lokistack(LokiStackSizeType::OneXSmall, 3);
        stack.spec.limits = Some(LimitsSpec {
            global: Some(LimitsTemplateSpec {
                ingestion_limits: Some(IngestionLimitSpec {
                    ingestion_rate: Some(-1),
                    ..Default::default()
                }),
                query_limits: None,
            }),
            ..Default::default()
        });
        let outcome = run(&stack, &FakeCluster::with_secrets(&["test-s3"])).await;
        assert_eq!(
            degraded_reason(&outcome),
            Some(LokiStackConditionReason::InvalidLimitsConfiguration)
        );
    }

    #[tokio::test]
    async fn test_missing_object_storage_secret_requeues() {
        let stack = create_test_lokistack(LokiStackSizeType::OneXSmall, 2);
        let outcome = run(&stack, &FakeCluster::with_secrets(&[])).await;

        assert_eq!(
            degraded_reason(&outcome),
            Some(LokiStackConditionReason::MissingObjectStorageSecret)
        );
        assert_eq!(outcome.action, Action::requeue(Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_missing_tenant_secret() {
        let mut stack = create_test_lokistack(LokiStackSizeType::OneXSmall, 2);
        stack.spec.tenants = Some(create_static_tenants(&["dev", "prod"]));
        let outcome = run(&stack, &FakeCluster::with_secrets(&["test-s3", "dev-oidc"])).await;

        assert_eq!(
            degraded_reason(&outcome),
            Some(LokiStackConditionReason::MissingGatewayTenantSecret)
        );
        assert!(outcome.error.unwrap().to_string().contains("prod-oidc"));
    }

    #[tokio::test]
    async fn test_static_tenancy_resolved() {
        let mut stack = create_test_lokistack(LokiStackSizeType::OneXSmall, 2);
        stack.spec.tenants = Some(create_static_tenants(&["dev"]));
        let outcome = run(&stack, &FakeCluster::with_secrets(&["test-s3", "dev-oidc"])).await;

        let tenancy = outcome.tenancy.unwrap();
        assert_eq!(tenancy.mode(), ModeType::Static);
        assert_eq!(tenancy.tenants(), ["dev".to_string()]);
    }

    #[tokio::test]
    async fn test_dynamic_without_opa_url() {
        let mut stack = create_test_lokistack(LokiStackSizeType::OneXSmall, 2);
        stack.spec.tenants = Some(create_dynamic_tenants(&["dev"], ""));
        let outcome = run(&stack, &FakeCluster::with_secrets(&["test-s3", "dev-oidc"])).await;

        assert_eq!(
            degraded_reason(&outcome),
            Some(LokiStackConditionReason::InvalidTenantsConfiguration)
        );
        assert!(outcome.tenancy.is_none());
    }

    #[tokio::test]
    async fn test_openshift_logging_resolves_base_domain() {
        let resolved = resolve_tenancy(
            &TenantsSpec::default(),
            &Offline {
                base_domain: Some("apps.example.com".to_string()),
            },
            DEFAULT_LOOKUP_TIMEOUT,
        )
        .await
        .unwrap();

        assert_eq!(
            resolved,
            ResolvedTenancy::OpenshiftLogging {
                tenants: vec![
                    "application".to_string(),
                    "infrastructure".to_string(),
                    "audit".to_string()
                ],
                base_domain: "apps.example.com".to_string(),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_base_domain_lookup_timeout_fails_closed() {
        let mut stack = create_test_lokistack(LokiStackSizeType::OneXSmall, 2);
        stack.spec.tenants = Some(TenantsSpec::default());
        let cluster = FakeCluster {
            secrets: ["test-s3".to_string()].into_iter().collect(),
            base_domain: None,
        };

        let outcome = reconcile_lokistack(
            &stack,
            ready(),
            &cluster,
            Duration::from_secs(2),
            1,
            now(),
        )
        .await
        .unwrap();

        assert!(outcome.tenancy.is_none());
        assert_eq!(
            degraded_reason(&outcome),
            Some(LokiStackConditionReason::MissingGatewayOpenShiftBaseDomain)
        );
        assert!(matches!(
            outcome.error,
            Some(Error::BaseDomain {
                source: context::Error::LookupTimeout { .. }
            })
        ));
        assert_eq!(outcome.action, Action::requeue(Duration::from_secs(10)));
    }

    #[tokio::test]
    async fn test_fixed_spec_clears_check_degradation() {
        let mut stack = create_test_lokistack(LokiStackSizeType::OneXSmall, 3);
        let ctx = FakeCluster::with_secrets(&["test-s3"]);
        let failed = run(&stack, &ctx).await;

        stack.spec.replication_factor = 2;
        stack.status = Some(failed.status);
        let fixed = run(&stack, &ctx).await;

        assert_eq!(fixed.status.conditions.len(), 1);
        assert!(fixed.status.condition(LokiStackConditionType::Ready).is_some());
    }

    #[tokio::test]
    async fn test_external_degradation_is_carried_forward() {
        let mut stack = create_test_lokistack(LokiStackSizeType::OneXSmall, 2);
        let ctx = FakeCluster::with_secrets(&["test-s3"]);
        let observed = Observed {
            degradation: Some(Degradation::Detected {
                reason: LokiStackConditionReason::InvalidObjectStorageSecret,
                message: "bucket unreachable".to_string(),
            }),
            ..ready()
        };
        let first = reconcile_lokistack(&stack, observed, &ctx, DEFAULT_LOOKUP_TIMEOUT, 0, now())
            .await
            .unwrap();

        stack.status = Some(first.status.clone());
        let second = run(&stack, &ctx).await;
        assert_eq!(second.status, first.status);
        assert_eq!(
            degraded_reason(&second),
            Some(LokiStackConditionReason::InvalidObjectStorageSecret)
        );
    }

    fn reported(reason: LokiStackConditionReason, message: &str) -> Observed {
        Observed {
            degradation: Some(Degradation::Detected {
                reason,
                message: message.to_string(),
            }),
            ..ready()
        }
    }

    #[tokio::test]
    async fn test_reported_degradation_survives_failed_check() {
        let mut stack = create_test_lokistack(LokiStackSizeType::OneXSmall, 2);
        let ctx = FakeCluster::with_secrets(&["test-s3"]);
        let observed = reported(
            LokiStackConditionReason::InvalidObjectStorageSecret,
            "bucket unreachable",
        );
        let first = reconcile_lokistack(&stack, observed, &ctx, DEFAULT_LOOKUP_TIMEOUT, 0, now())
            .await
            .unwrap();

        stack.status = Some(first.status);
        stack.spec.replication_factor = 3;
        let broken = run(&stack, &ctx).await;
        assert_eq!(
            degraded_reason(&broken),
            Some(LokiStackConditionReason::InvalidReplicationConfiguration)
        );
        assert!(broken.status.reported_degradation.is_some());

        stack.status = Some(broken.status);
        stack.spec.replication_factor = 2;
        let fixed = run(&stack, &ctx).await;
        assert_eq!(
            degraded_reason(&fixed),
            Some(LokiStackConditionReason::InvalidObjectStorageSecret)
        );
        let degraded = fixed
            .status
            .condition(LokiStackConditionType::Degraded)
            .unwrap();
        assert_eq!(degraded.message, "bucket unreachable");
        assert!(fixed.status.condition(LokiStackConditionType::Ready).is_none());
    }

    #[tokio::test]
    async fn test_reported_reason_shared_with_checks_is_kept() {
        let mut stack = create_test_lokistack(LokiStackSizeType::OneXSmall, 2);
        let ctx = FakeCluster::with_secrets(&["test-s3"]);
        let observed = reported(
            LokiStackConditionReason::MissingObjectStorageSecret,
            "secret rotated away",
        );
        let first = reconcile_lokistack(&stack, observed, &ctx, DEFAULT_LOOKUP_TIMEOUT, 0, now())
            .await
            .unwrap();

        stack.status = Some(first.status);
        let second = run(&stack, &ctx).await;
        assert_eq!(
            degraded_reason(&second),
            Some(LokiStackConditionReason::MissingObjectStorageSecret)
        );
    }

    #[tokio::test]
    async fn test_reported_degradation_cleared_by_reporter() {
        let mut stack = create_test_lokistack(LokiStackSizeType::OneXSmall, 2);
        let ctx = FakeCluster::with_secrets(&["test-s3"]);
        let observed = reported(
            LokiStackConditionReason::InvalidObjectStorageSecret,
            "bucket unreachable",
        );
        let first = reconcile_lokistack(&stack, observed, &ctx, DEFAULT_LOOKUP_TIMEOUT, 0, now())
            .await
            .unwrap();

        stack.status = Some(first.status);
        let cleared = Observed {
            degradation: Some(Degradation::Cleared),
            ..ready()
        };
        let second = reconcile_lokistack(&stack, cleared, &ctx, DEFAULT_LOOKUP_TIMEOUT, 0, now())
            .await
            .unwrap();

        assert!(second.status.reported_degradation.is_none());
        assert_eq!(second.status.conditions.len(), 1);
        assert!(second.status.condition(LokiStackConditionType::Ready).is_some());
    }
}
