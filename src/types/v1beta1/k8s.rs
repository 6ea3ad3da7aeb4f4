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

//! Closed value sets shared across the LokiStack spec and status

use k8s_openapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Whether the operator reconciles a LokiStack at all.
/// - Managed: the operator owns and reconciles the stack (default)
/// - Unmanaged: the operator leaves the stack and its status untouched
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
pub enum ManagementStateType {
    #[default]
    Managed,

    Unmanaged,
}

/// Supported Loki deployment scale-out sizes.
///
/// `1x.extra-small` runs without HA and is meant for development and demos only.
/// `1x.small` and `1x.medium` run every component highly available.
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
pub enum LokiStackSizeType {
    #[serde(rename = "1x.extra-small")]
    #[strum(serialize = "1x.extra-small")]
    OneXExtraSmall,

    #[serde(rename = "1x.small")]
    #[strum(serialize = "1x.small")]
    OneXSmall,

    #[serde(rename = "1x.medium")]
    #[strum(serialize = "1x.medium")]
    OneXMedium,
}

/// Pod lifecycle phase as reported by the kubelet.
///
/// https://kubernetes.io/docs/concepts/workloads/pods/pod-lifecycle/#pod-phase
#[derive(
    Deserialize,
    Serialize,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    JsonSchema,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}
