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

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Limits applied on the query path.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryLimitSpec {
    /// Maximum number of log entries returned for a query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_entries_limit_per_query: Option<i32>,

    /// Maximum number of chunks a single query may fetch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_chunks_per_query: Option<i32>,

    /// Maximum number of unique series returned by a metric query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_query_series: Option<i32>,
}

/// Limits applied on the ingestion path.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngestionLimitSpec {
    /// Sample size per second, in MB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingestion_rate: Option<i32>,

    /// Local rate-limited sample size per distributor replica, in MB.
    /// Should be at least the largest push request expected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingestion_burst_size: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_label_name_length: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_label_value_length: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_label_names_per_series: Option<i32>,

    /// Maximum number of active streams per tenant across the cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_global_streams_per_tenant: Option<i32>,

    /// Maximum line size on the ingestion path, in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_line_size: Option<i32>,
}

/// Ingestion and query limits for the whole cluster or a single tenant.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LimitsTemplateSpec {
    #[serde(
        rename = "ingestion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub ingestion_limits: Option<IngestionLimitSpec>,

    #[serde(rename = "queries", default, skip_serializing_if = "Option::is_none")]
    pub query_limits: Option<QueryLimitSpec>,
}

/// Global limits plus per-tenant overrides keyed by tenant name.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LimitsSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global: Option<LimitsTemplateSpec>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tenants: BTreeMap<String, LimitsTemplateSpec>,
}

impl QueryLimitSpec {
    /// Field values keyed by their wire name.
    pub fn fields(&self) -> [(&'static str, Option<i32>); 3] {
        [
            ("maxEntriesLimitPerQuery", self.max_entries_limit_per_query),
            ("maxChunksPerQuery", self.max_chunks_per_query),
            ("maxQuerySeries", self.max_query_series),
        ]
    }

    fn overlay(&self, base: &Self) -> Self {
        Self {
            max_entries_limit_per_query: self
                .max_entries_limit_per_query
                .or(base.max_entries_limit_per_query),
            max_chunks_per_query: self.max_chunks_per_query.or(base.max_chunks_per_query),
            max_query_series: self.max_query_series.or(base.max_query_series),
        }
    }
}

impl IngestionLimitSpec {
    /// Field values keyed by their wire name.
    pub fn fields(&self) -> [(&'static str, Option<i32>); 7] {
        [
            ("ingestionRate", self.ingestion_rate),
            ("ingestionBurstSize", self.ingestion_burst_size),
            ("maxLabelNameLength", self.max_label_name_length),
            ("maxLabelValueLength", self.max_label_value_length),
            ("maxLabelNamesPerSeries", self.max_label_names_per_series),
            ("maxGlobalStreamsPerTenant", self.max_global_streams_per_tenant),
            ("maxLineSize", self.max_line_size),
        ]
    }

    fn overlay(&self, base: &Self) -> Self {
        Self {
            ingestion_rate: self.ingestion_rate.or(base.ingestion_rate),
            ingestion_burst_size: self.ingestion_burst_size.or(base.ingestion_burst_size),
            max_label_name_length: self.max_label_name_length.or(base.max_label_name_length),
            max_label_value_length: self.max_label_value_length.or(base.max_label_value_length),
            max_label_names_per_series: self
                .max_label_names_per_series
                .or(base.max_label_names_per_series),
            max_global_streams_per_tenant: self
                .max_global_streams_per_tenant
                .or(base.max_global_streams_per_tenant),
            max_line_size: self.max_line_size.or(base.max_line_size),
        }
    }
}

fn overlay_opt<T: Clone>(over: Option<&T>, base: Option<&T>, merge: fn(&T, &T) -> T) -> Option<T> {
    match (over, base) {
        (Some(o), Some(b)) => Some(merge(o, b)),
        (o, b) => o.or(b).cloned(),
    }
}

impl LimitsTemplateSpec {
    /// Field-wise overlay: every field set on `self` wins, unset fields fall back to `base`.
    pub fn overlay(&self, base: &Self) -> Self {
        Self {
            ingestion_limits: overlay_opt(
                self.ingestion_limits.as_ref(),
                base.ingestion_limits.as_ref(),
                IngestionLimitSpec::overlay,
            ),
            query_limits: overlay_opt(
                self.query_limits.as_ref(),
                base.query_limits.as_ref(),
                QueryLimitSpec::overlay,
            ),
        }
    }
}

impl LimitsSpec {
    /// Effective limits for `tenant`. Fields left unset in both the tenant entry and
    /// the global template stay `None`, which means unbounded.
    pub fn resolve(&self, tenant: &str) -> LimitsTemplateSpec {
        let global = self.global.clone().unwrap_or_default();
        match self.tenants.get(tenant) {
            Some(overrides) => overrides.overlay(&global),
            None => global,
        }
    }
}
