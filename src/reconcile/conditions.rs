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

//! Folds per-component pod phases into the top-level LokiStack conditions.

use crate::types::v1beta1::k8s::PodPhase;
use crate::types::v1beta1::status::components::Component;
use crate::types::v1beta1::status::{
    Condition, LokiStackComponentStatus, LokiStackConditionReason, LokiStackConditionType,
    PodStatusMap,
};
use chrono::{DateTime, Utc};
use strum::IntoEnumIterator;

/// Health of a single component, ordered by precedence (highest last).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ComponentHealth {
    Ready,
    Pending,
    Failed,
}

/// Overall health, ordered by precedence (highest last).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Health {
    Ready,
    Pending,
    Degraded,
    Failed,
}

/// Degradation detected outside the pod phases (object storage, validation checks).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Degradation {
    Detected {
        reason: LokiStackConditionReason,
        message: String,
    },
    Cleared,
}

fn has_pods(pods: &PodStatusMap, phase: PodPhase) -> bool {
    pods.get(&phase).is_some_and(|names| !names.is_empty())
}

/// Classifies a component from its pods.
///
/// Failed when pods are Failed or Unknown and none is Running. Ready when every
/// pod is Running or Succeeded. Anything else, including a partial rollout with
/// both Running and Failed pods, is Pending. A component without pods is not
/// deployed and yields `None`.
pub fn classify(pods: &PodStatusMap) -> Option<ComponentHealth> {
    if pods.values().all(Vec::is_empty) {
        return None;
    }

    let running = has_pods(pods, PodPhase::Running);
    let broken = has_pods(pods, PodPhase::Failed) || has_pods(pods, PodPhase::Unknown);

    if broken && !running {
        Some(ComponentHealth::Failed)
    } else if has_pods(pods, PodPhase::Pending) || broken {
        Some(ComponentHealth::Pending)
    } else {
        Some(ComponentHealth::Ready)
    }
}

fn components_in(
    components: &LokiStackComponentStatus,
    health: ComponentHealth,
) -> Vec<&'static str> {
    Component::iter()
        .filter(|c| classify(components.get(*c)) == Some(health))
        .map(|c| -> &'static str { c.into() })
        .collect()
}

/// Computes the status conditions for one reconciliation pass.
///
/// Exactly one of Ready, Pending, Failed or Degraded is reported as the overall
/// state, with precedence Failed > Degraded > Pending > Ready. A standing Degraded
/// condition from `previous` is carried forward unless `degradation` clears it,
/// and is kept next to a Failed overall state. Conditions whose type, status and
/// reason did not change keep their previous transition time. The result is
/// sorted by type name.
pub fn aggregate(
    components: &LokiStackComponentStatus,
    degradation: Option<&Degradation>,
    previous: &[Condition],
    generation: Option<i64>,
    now: DateTime<Utc>,
) -> Vec<Condition> {
    let failed = components_in(components, ComponentHealth::Failed);
    let pending = components_in(components, ComponentHealth::Pending);

    let degraded = match degradation {
        Some(Degradation::Detected { reason, message }) => Some((*reason, message.clone())),
        Some(Degradation::Cleared) => None,
        None => previous
            .iter()
            .find(|c| c.type_ == LokiStackConditionType::Degraded && c.is_true())
            .map(|c| (c.reason, c.message.clone())),
    };

    let health = if !failed.is_empty() {
        Health::Failed
    } else if degraded.is_some() {
        Health::Degraded
    } else if !pending.is_empty() {
        Health::Pending
    } else {
        Health::Ready
    };

    let mut conditions = Vec::with_capacity(2);
    match health {
        Health::Failed => conditions.push(Condition::new(
            LokiStackConditionType::Failed,
            LokiStackConditionReason::FailedComponents,
            format!("Some LokiStack components failed: {}", failed.join(", ")),
            now,
        )),
        Health::Pending => conditions.push(Condition::new(
            LokiStackConditionType::Pending,
            LokiStackConditionReason::PendingComponents,
            format!(
                "Some LokiStack components pending on dependencies: {}",
                pending.join(", ")
            ),
            now,
        )),
        Health::Ready => conditions.push(Condition::new(
            LokiStackConditionType::Ready,
            LokiStackConditionReason::ReadyComponents,
            "All components ready",
            now,
        )),
        Health::Degraded => {}
    }
    if let Some((reason, message)) = degraded {
        conditions.push(Condition::new(
            LokiStackConditionType::Degraded,
            reason,
            message,
            now,
        ));
    }

    let mut conditions: Vec<Condition> = conditions
        .into_iter()
        .map(|mut condition| {
            if let Some(prev) = previous.iter().find(|p| p.same_state(&condition)) {
                condition.last_transition_time = prev.last_transition_time.clone();
            }
            condition.with_generation(generation)
        })
        .collect();
    conditions.sort_by(|a, b| a.type_.as_ref().cmp(b.type_.as_ref()));
    conditions
}
