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

use crate::types::v1beta1::k8s::PodPhase;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{AsRefStr, Display, EnumIter, IntoStaticStr};

/// Pod names grouped by their current phase.
pub type PodStatusMap = BTreeMap<PodPhase, Vec<String>>;

/// The six Loki components whose pods are tracked in the status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, AsRefStr, IntoStaticStr, EnumIter)]
#[strum(serialize_all = "camelCase")]
pub enum Component {
    Compactor,
    Distributor,
    Ingester,
    Querier,
    QueryFrontend,
    Gateway,
}

/// Per-component pod status of a LokiStack.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LokiStackComponentStatus {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    #[schemars(with = "BTreeMap<String, Vec<String>>")]
    pub compactor: PodStatusMap,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    #[schemars(with = "BTreeMap<String, Vec<String>>")]
    pub distributor: PodStatusMap,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    #[schemars(with = "BTreeMap<String, Vec<String>>")]
    pub ingester: PodStatusMap,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    #[schemars(with = "BTreeMap<String, Vec<String>>")]
    pub querier: PodStatusMap,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    #[schemars(with = "BTreeMap<String, Vec<String>>")]
    pub query_frontend: PodStatusMap,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    #[schemars(with = "BTreeMap<String, Vec<String>>")]
    pub gateway: PodStatusMap,
}

impl LokiStackComponentStatus {
    pub fn get(&self, component: Component) -> &PodStatusMap {
        match component {
            Component::Compactor => &self.compactor,
            Component::Distributor => &self.distributor,
            Component::Ingester => &self.ingester,
            Component::Querier => &self.querier,
            Component::QueryFrontend => &self.query_frontend,
            Component::Gateway => &self.gateway,
        }
    }

    pub fn get_mut(&mut self, component: Component) -> &mut PodStatusMap {
        match component {
            Component::Compactor => &mut self.compactor,
            Component::Distributor => &mut self.distributor,
            Component::Ingester => &mut self.ingester,
            Component::Querier => &mut self.querier,
            Component::QueryFrontend => &mut self.query_frontend,
            Component::Gateway => &mut self.gateway,
        }
    }
}
