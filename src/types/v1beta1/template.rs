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

use k8s_openapi::api::core::v1 as corev1;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scheduling overrides for a single Loki component.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LokiComponentSpec {
    /// Number of replica pods of the component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    /// Labels a node must carry to host the component.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub node_selector: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tolerations: Vec<corev1::Toleration>,
}

/// Per-component scheduling template for every Loki component.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LokiTemplateSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compactor: Option<LokiComponentSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distributor: Option<LokiComponentSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingester: Option<LokiComponentSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub querier: Option<LokiComponentSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_frontend: Option<LokiComponentSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<LokiComponentSpec>,
}
