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

pub mod components;
pub mod condition;

use kube::KubeSchema;
use serde::{Deserialize, Serialize};

pub use components::{LokiStackComponentStatus, PodStatusMap};
pub use condition::{
    Condition, ConditionStatus, LokiStackConditionReason, LokiStackConditionType,
    ReportedDegradation,
};

/// Observed state of a LokiStack, fully owned by the operator.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, KubeSchema)]
#[serde(rename_all = "camelCase")]
pub struct LokiStackStatus {
    /// Pod status summary grouped per component.
    #[serde(default)]
    pub components: LokiStackComponentStatus,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// Standing external degradation, restored once failing checks pass again.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_degradation: Option<ReportedDegradation>,
}

impl LokiStackStatus {
    /// The condition of the given type, if present.
    pub fn condition(&self, type_: LokiStackConditionType) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.type_ == type_)
    }
}
