//! Server Configuration
//! Mission: Command-line flags with environment fallbacks (`.env` is loaded first)

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "house-hunter")]
#[command(about = "House Hunter rental listing API")]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "5000")]
    pub port: u16,

    /// Address to bind the listener to
    #[arg(long, env = "BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: String,

    /// Path to the SQLite document store
    #[arg(long, env = "DATABASE_PATH", default_value = "house_hunter.db")]
    pub database_path: String,

    /// Secret used to sign and verify access tokens
    #[arg(long, env = "ACCESS_TOKEN", hide_env_values = true)]
    pub access_token_secret: String,
}

impl Config {
    /// `host:port` string for the TCP listener
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
