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

use chrono::{DateTime, SecondsFormat, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Health of a Loki deployment as a whole.
#[derive(
    Deserialize,
    Serialize,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    JsonSchema,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
pub enum LokiStackConditionType {
    /// All components are ready.
    Ready,
    /// Some or all components are pending.
    Pending,
    /// Components failed to roll out.
    Failed,
    /// Components are degraded or object storage is unreachable.
    Degraded,
}

/// Machine-readable reason attached to a LokiStack condition.
#[derive(
    Deserialize,
    Serialize,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    JsonSchema,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
pub enum LokiStackConditionReason {
    FailedComponents,
    PendingComponents,
    ReadyComponents,
    MissingObjectStorageSecret,
    InvalidObjectStorageSecret,
    /// Replication factor not supported by the selected size.
    InvalidReplicationConfiguration,
    MissingGatewayTenantSecret,
    InvalidGatewayTenantSecret,
    InvalidTenantsConfiguration,
    /// The OpenShift DNS base domain could not be looked up.
    MissingGatewayOpenShiftBaseDomain,
    InvalidLimitsConfiguration,
}

#[derive(
    Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema, Display, EnumString,
)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

/// Condition record following the Kubernetes condition conventions.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: LokiStackConditionType,

    pub status: ConditionStatus,

    pub reason: LokiStackConditionReason,

    #[serde(default)]
    pub message: String,

    /// RFC3339 timestamp of the last status change.
    pub last_transition_time: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

impl Condition {
    pub fn new(
        type_: LokiStackConditionType,
        reason: LokiStackConditionReason,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            type_,
            status: ConditionStatus::True,
            reason,
            message: message.into(),
            last_transition_time: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            observed_generation: None,
        }
    }

    pub fn with_generation(mut self, generation: Option<i64>) -> Self {
        self.observed_generation = generation;
        self
    }

    pub fn is_true(&self) -> bool {
        self.status == ConditionStatus::True
    }

    /// Same type, status and reason: the condition has not transitioned.
    pub fn same_state(&self, other: &Condition) -> bool {
        self.type_ == other.type_ && self.status == other.status && self.reason == other.reason
    }
}

/// Degraded signal reported from outside the reconciliation checks, such as an
/// unreachable object storage. Stays in the status until the reporter clears it.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq, JsonSchema)]
pub struct ReportedDegradation {
    pub reason: LokiStackConditionReason,

    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_reason_wire_strings() {
        assert_eq!(
            LokiStackConditionReason::MissingGatewayOpenShiftBaseDomain.to_string(),
            "MissingGatewayOpenShiftBaseDomain"
        );
        assert_eq!(
            serde_json::to_string(&LokiStackConditionReason::InvalidReplicationConfiguration)
                .unwrap(),
            r#""InvalidReplicationConfiguration""#
        );
    }

    #[test]
    fn test_condition_wire_format() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let cond = Condition::new(
            LokiStackConditionType::Ready,
            LokiStackConditionReason::ReadyComponents,
            "All components ready",
            now,
        )
        .with_generation(Some(3));

        let json = serde_json::to_value(&cond).unwrap();
        assert_eq!(json["type"], "Ready");
        assert_eq!(json["status"], "True");
        assert_eq!(json["reason"], "ReadyComponents");
        assert_eq!(json["lastTransitionTime"], "2024-05-01T12:00:00Z");
        assert_eq!(json["observedGeneration"], 3);
    }
}
