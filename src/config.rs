//! Typed view over the process's environment contract. Grounded on
//! `songbird::Config`'s pattern of a plain struct with one field per knob,
//! built once at startup and threaded down rather than read from the
//! environment ad hoc.

#[derive(Debug, Clone)]
pub struct Config {
    /// RPC listen port. `SERVER_PORT`, default `50101`.
    pub server_port: u16,
    /// Object-store sidecar port. `DAPR_GRPC_PORT`, default `50001`. Kept
    /// for fidelity to the original contract even though this crate talks
    /// to the `ObjectStore` trait rather than dialing Dapr directly.
    pub dapr_grpc_port: u16,
    /// Upload chunk ceiling in megabytes. `DAPR_MAX_REQUEST_SIZE_MB`,
    /// default `100`.
    pub dapr_max_request_size_mb: u32,
    /// Logical object store id. `OBJECT_STORE_NAME`, default
    /// `object-store`.
    pub object_store_name: String,
    /// Whether the store expects base64-encoded payloads.
    /// `OBJECT_STORE_B64`, default `true`.
    pub object_store_b64: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 50101,
            dapr_grpc_port: 50001,
            dapr_max_request_size_mb: 100,
            object_store_name: "object-store".to_string(),
            object_store_b64: true,
        }
    }
}

impl Config {
    /// Reads the environment contract (spec §6), falling back to defaults
    /// for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_parsed("SERVER_PORT", defaults.server_port),
            dapr_grpc_port: env_parsed("DAPR_GRPC_PORT", defaults.dapr_grpc_port),
            dapr_max_request_size_mb: env_parsed(
                "DAPR_MAX_REQUEST_SIZE_MB",
                defaults.dapr_max_request_size_mb,
            ),
            object_store_name: std::env::var("OBJECT_STORE_NAME")
                .unwrap_or(defaults.object_store_name),
            object_store_b64: env_parsed("OBJECT_STORE_B64", defaults.object_store_b64),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_contract() {
        let c = Config::default();
        assert_eq!(c.server_port, 50101);
        assert_eq!(c.dapr_grpc_port, 50001);
        assert_eq!(c.dapr_max_request_size_mb, 100);
        assert_eq!(c.object_store_name, "object-store");
        assert!(c.object_store_b64);
    }
}
