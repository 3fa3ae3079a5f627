//! config-rs/lib.rs
//! Shared configuration utilities for the essay services
//! Provides standardized functions for port/address management

use std::env;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Load a `.env` file from the working directory or its parents, if any
///
/// # Returns
/// The path of the loaded file
pub fn load_dotenv() -> Option<PathBuf> {
    match dotenv::dotenv() {
        Ok(path) => Some(path),
        Err(e) if e.not_found() => None,
        Err(e) => {
            log::warn!("Failed to load .env file: {}", e);
            None
        }
    }
}

/// Environment variable prefix for a service name (`essay-gateway` -> `ESSAY_GATEWAY`)
fn env_prefix(service_name: &str) -> String {
    service_name.to_uppercase().replace('-', "_")
}

/// Get service port from environment variables with proper fallback
///
/// # Arguments
/// * `service_name` - The name of the service (e.g., "ESSAY_GATEWAY")
/// * `default_port` - The default port to use if not specified in environment
///
/// # Returns
/// The port number to use for the service
pub fn get_service_port(service_name: &str, default_port: u16) -> u16 {
    let var_name = format!("{}_SERVICE_PORT", env_prefix(service_name));
    match env::var(&var_name) {
        Ok(value) => value.trim().parse::<u16>().unwrap_or_else(|_| {
            log::warn!("Invalid port in {}, using default {}", var_name, default_port);
            default_port
        }),
        Err(_) => default_port,
    }
}

/// Create a SocketAddr for binding a service
///
/// # Arguments
/// * `service_name` - The name of the service (e.g., "ESSAY_GATEWAY")
/// * `default_port` - The default port to use if not specified in environment
///
/// # Returns
/// A SocketAddr configured with the appropriate bind address and port
pub fn get_bind_address(service_name: &str, default_port: u16) -> SocketAddr {
    let var_name = format!("{}_SERVICE_ADDR", env_prefix(service_name));

    // Check if there's a full address override
    if let Ok(addr_str) = env::var(&var_name) {
        let trimmed = addr_str
            .trim()
            .trim_start_matches("http://")
            .trim_start_matches("https://");
        match trimmed.parse::<SocketAddr>() {
            Ok(addr) => return addr,
            Err(_) => log::warn!("Invalid address format in {}, using default", var_name),
        }
    }

    let port = get_service_port(service_name, default_port);
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))
}

/// Get default port for a specific service
pub fn get_default_port(service_name: &str) -> u16 {
    match env_prefix(service_name).as_str() {
        "ESSAY_GATEWAY" => 8282,
        _ => 8080,
    }
}

/// Per-service view over the helpers above
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    name: String,
}

impl ServiceConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn service_name(&self) -> &str {
        &self.name
    }

    /// Address from `{NAME}_SERVICE_ADDR`, else `0.0.0.0` with the service port
    pub fn get_bind_address(&self, default_port: u16) -> SocketAddr {
        get_bind_address(&self.name, default_port)
    }

    /// Bind address using this service's well-known default port
    pub fn default_bind_address(&self) -> SocketAddr {
        self.get_bind_address(get_default_port(&self.name))
    }
}
