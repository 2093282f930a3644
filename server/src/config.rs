use std::path::PathBuf;
use std::time::Duration;

/// Everything the server needs at construction time
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub max_clients: usize,
    pub client_timeout: Duration,
    /// JSON layout file; `None` starts a town with no areas
    pub map_path: Option<PathBuf>,
    pub spawn: (f32, f32),
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            max_clients: 32,
            client_timeout: Duration::from_secs(5),
            map_path: None,
            spawn: (0.0, 0.0),
        }
    }
}
