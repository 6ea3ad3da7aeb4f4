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

use super::{Error, InvalidReplicationConfigurationSnafu};
use crate::types::v1beta1::k8s::LokiStackSizeType;
use snafu::ensure;

/// Highest replication factor a size tier can honour.
pub fn max_replication_factor(size: LokiStackSizeType) -> i32 {
    match size {
        LokiStackSizeType::OneXExtraSmall => 1,
        LokiStackSizeType::OneXSmall => 2,
        LokiStackSizeType::OneXMedium => 3,
    }
}

pub fn validate_replication(size: LokiStackSizeType, factor: i32) -> Result<(), Error> {
    let max = max_replication_factor(size);
    ensure!(
        (1..=max).contains(&factor),
        InvalidReplicationConfigurationSnafu { size, factor, max }
    );
    Ok(())
}
