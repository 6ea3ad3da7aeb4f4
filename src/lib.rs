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

use crate::context::{BaseDomainProvider, Context, Offline, SecretChecker};
use crate::reconcile::{Observed, reconcile_lokistack};
use crate::types::v1beta1::lokistack::LokiStack;
use crate::types::v1beta1::status::LokiStackComponentStatus;
use kube::{Client, CustomResourceExt};
use std::pin::Pin;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

pub mod context;
pub mod error_policy;
pub mod reconcile;
pub mod types;
pub mod validation;


async fn open_writer(file: Option<String>) -> std::io::Result<Pin<Box<dyn AsyncWrite + Send>>> {
    Ok(if let Some(file) = file {
        Box::pin(
            tokio::fs::OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(file)
                .await?,
        )
    } else {
        Box::pin(tokio::io::stdout())
    })
}

pub async fn crd(file: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = open_writer(file).await?;

    writer
        .write_all(serde_yaml_ng::to_string(&LokiStack::crd())?.as_bytes())
        .await?;

    Ok(())
}

/// Options of the `validate` command.
#[derive(Debug, Clone)]
pub struct ValidateOptions {
    pub file: String,
    pub components: Option<String>,
    /// When set, no cluster is contacted: secrets are assumed present.
    pub base_domain: Option<String>,
    pub lookup_timeout: Duration,
}

/// Evaluates one reconciliation pass for a LokiStack manifest and prints the
/// resulting status as YAML.
pub async fn validate(opts: ValidateOptions) -> Result<(), Box<dyn std::error::Error>> {
    let stack: LokiStack = serde_yaml_ng::from_str(&tokio::fs::read_to_string(&opts.file).await?)?;

    let components = match &opts.components {
        Some(path) => serde_yaml_ng::from_str::<LokiStackComponentStatus>(
            &tokio::fs::read_to_string(path).await?,
        )?,
        None => LokiStackComponentStatus::default(),
    };
    let observed = Observed {
        components,
        degradation: None,
    };

    match opts.base_domain.clone() {
        Some(base_domain) => {
            let ctx = Offline {
                base_domain: Some(base_domain),
            };
            evaluate(&stack, observed, &ctx, opts.lookup_timeout).await
        }
        None => {
            let ctx = Context::new(Client::try_default().await?);
            evaluate(&stack, observed, &ctx, opts.lookup_timeout).await
        }
    }
}

async fn evaluate<C>(
    stack: &LokiStack,
    observed: Observed,
    ctx: &C,
    lookup_timeout: Duration,
) -> Result<(), Box<dyn std::error::Error>>
where
    C: SecretChecker + BaseDomainProvider + Sync,
{
    let Some(outcome) =
        reconcile_lokistack(stack, observed, ctx, lookup_timeout, 0, chrono::Utc::now()).await
    else {
        info!(lokistack = %stack.key(), "lokistack is unmanaged, nothing to evaluate");
        return Ok(());
    };

    if let Some(err) = &outcome.error {
        warn!(lokistack = %stack.key(), "lokistack is degraded: {}", err);
    }
    if let Some(tenancy) = &outcome.tenancy {
        info!(mode = %tenancy.mode(), tenants = ?tenancy.tenants(), "gateway tenancy resolved");
    }

    let mut writer = open_writer(None).await?;
    writer
        .write_all(serde_yaml_ng::to_string(&outcome.status)?.as_bytes())
        .await?;
    writer.flush().await?;

    Ok(())
}
