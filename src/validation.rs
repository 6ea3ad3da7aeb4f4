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

//! Pure checks of a LokiStack spec. Nothing here performs I/O.

pub mod limits;
pub mod replication;
pub mod tenancy;

use crate::types::v1beta1::k8s::LokiStackSizeType;
use crate::types::v1beta1::status::LokiStackConditionReason;
use snafu::Snafu;
use std::fmt;

pub use limits::{limit_violations, validate_limits};
pub use replication::{max_replication_factor, validate_replication};
pub use tenancy::validate_tenancy;

/// A single offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Dotted path of the field, e.g. `spec.limits.global.ingestion.ingestionRate`.
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

fn join(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("invalid limits configuration: {}", join(violations)))]
    InvalidLimitsConfiguration { violations: Vec<Violation> },

    #[snafu(display(
        "replication factor {} is not supported by size {}: must be between 1 and max={}",
        factor,
        size,
        max
    ))]
    InvalidReplicationConfiguration {
        size: LokiStackSizeType,
        factor: i32,
        max: i32,
    },

    #[snafu(display("invalid tenants configuration: {}", join(violations)))]
    InvalidTenantsConfiguration { violations: Vec<Violation> },
}

impl Error {
    pub fn reason(&self) -> LokiStackConditionReason {
        match self {
            Error::InvalidLimitsConfiguration { .. } => {
                LokiStackConditionReason::InvalidLimitsConfiguration
            }
            Error::InvalidReplicationConfiguration { .. } => {
                LokiStackConditionReason::InvalidReplicationConfiguration
            }
            Error::InvalidTenantsConfiguration { .. } => {
                LokiStackConditionReason::InvalidTenantsConfiguration
            }
        }
    }

    /// Every offending field, empty for single-value errors.
    pub fn violations(&self) -> &[Violation] {
        match self {
            Error::InvalidLimitsConfiguration { violations }
            | Error::InvalidTenantsConfiguration { violations } => violations.as_slice(),
            Error::InvalidReplicationConfiguration { .. } => &[],
        }
    }
}
