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

use clap::{Parser, Subcommand};
use operator::reconcile::DEFAULT_LOOKUP_TIMEOUT;
use operator::{ValidateOptions, crd, validate};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

shadow_rs::shadow!(build);

#[derive(Parser)]
#[command(name = "lokistack-op")]
#[command(about = "LokiStack Kubernetes Operator CLI", long_about = None)]
#[command(version = build::CLAP_LONG_VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Output CRDs in YAML
    Crd {
        /// Optional output path. If not set, the output will be written to stdout.
        #[arg(short, long)]
        file: Option<String>,
    },

    /// Evaluate a LokiStack manifest and print the computed status
    Validate {
        /// Path to the LokiStack YAML manifest.
        #[arg(short, long)]
        file: String,

        /// Optional YAML file with the observed per-component pod status.
        #[arg(short, long)]
        components: Option<String>,

        /// Use this base domain and skip every cluster lookup.
        #[arg(long)]
        base_domain: Option<String>,

        /// Timeout for the OpenShift base domain lookup.
        #[arg(long, default_value_t = DEFAULT_LOOKUP_TIMEOUT.as_secs())]
        lookup_timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Crd { file } => crd(file).await?,
        Commands::Validate {
            file,
            components,
            base_domain,
            lookup_timeout_secs,
        } => {
            validate(ValidateOptions {
                file,
                components,
                base_domain,
                lookup_timeout: Duration::from_secs(lookup_timeout_secs),
            })
            .await?
        }
    }

    Ok(())
}
