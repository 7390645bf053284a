use clap::Parser;

use crate::config::{AppConfig, StoreBackend};

/// Command-line overrides applied on top of the environment configuration
#[derive(Debug, Parser)]
#[command(name = "tally-api")]
#[command(about = "Session-authenticated REST backend for variables, date records and records")]
#[command(version)]
pub struct Cli {
    #[arg(long, help = "Address to bind (overrides HOST)")]
    pub host: Option<String>,

    #[arg(long, help = "Port to listen on (overrides PORT)")]
    pub port: Option<u16>,

    #[arg(long, value_enum, help = "Storage backend (overrides STORE_BACKEND)")]
    pub store: Option<StoreBackend>,
}

impl Cli {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(store) = self.store {
            config.store = store;
        }
    }
}
