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

use crate::reconcile::Error;
use kube::runtime::controller::Action;
use std::time::Duration;
use tracing::error;

const MIN_BACKOFF: Duration = Duration::from_secs(5);
const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Spec errors wait for the user to change the object. Collaborator errors are
/// retried with exponential backoff on the number of failed attempts so far.
pub fn error_policy(error: &Error, attempts: u32) -> Action {
    error!(reason = %error.reason(), attempts, "error_policy: {}", error);

    if error.is_validation() {
        Action::await_change()
    } else {
        Action::requeue(backoff(attempts))
    }
}

fn backoff(attempts: u32) -> Duration {
    MIN_BACKOFF
        .saturating_mul(2u32.saturating_pow(attempts))
        .min(MAX_BACKOFF)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::context;
    use crate::types::v1beta1::k8s::LokiStackSizeType;
    use crate::validation;

    #[test]
    fn test_validation_errors_await_change() {
        let err: Error = validation::validate_replication(LokiStackSizeType::OneXExtraSmall, 2)
            .unwrap_err()
            .into();
        assert_eq!(error_policy(&err, 3), Action::await_change());
    }

    #[test]
    fn test_collaborator_errors_back_off() {
        let err = Error::BaseDomain {
            source: context::Error::MissingBaseDomain,
        };
        assert_eq!(error_policy(&err, 0), Action::requeue(Duration::from_secs(5)));
        assert_eq!(error_policy(&err, 2), Action::requeue(Duration::from_secs(20)));
        assert_eq!(error_policy(&err, 40), Action::requeue(MAX_BACKOFF));
    }
}
