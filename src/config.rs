use anyhow::Result;
use std::env;
use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:school.db".to_string());

        let database_max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(raw) => raw.parse::<u32>().map_err(|e| {
                anyhow::anyhow!("DATABASE_MAX_CONNECTIONS must be a positive integer: {}", e)
            })?,
            Err(_) => 5,
        };
        if database_max_connections == 0 {
            return Err(anyhow::anyhow!("DATABASE_MAX_CONNECTIONS must be at least 1"));
        }

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| anyhow::anyhow!("BIND_ADDR is not a valid socket address: {}", e))?;

        Ok(Config {
            database_url,
            database_max_connections,
            bind_addr,
        })
    }
}
