// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Cashcast projects the monthly cash flow of an organisation from its
//! transactions, salaries and salary costs.

pub mod cli;
pub mod commands;
pub mod db;
pub mod errors;
pub mod forecast;
pub mod models;
pub mod store;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Installs the global tracing subscriber. `RUST_LOG` overrides the default
/// `cashcast=info` filter; output goes to stderr.
pub fn init() {
    INIT_TRACING.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("cashcast=info"));
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
