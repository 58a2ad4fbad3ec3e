//! Immutable facts every behavior may need.

use std::time::Duration;

use axum::http::HeaderValue;

use crate::config::ServerConfig;
use crate::timing::WaitResolver;

/// Server identity and timing shared by all behaviors.
///
/// Built once the listener is bound, so `port` is the real port even when
/// the configured one was `0`.
#[derive(Debug, Clone)]
pub struct BehaviorContext {
    /// Value of the `Server` header, `wirefault <version>`.
    pub server: String,
    /// Normalized path prefix, e.g. `/wirefault/`.
    pub prefix: String,
    pub port: u16,
    pub wait: WaitResolver,
    /// Hold time for the hang-up behaviors.
    pub hangup: Duration,
    /// Idle bound for reading request heads and lingering websockets.
    pub idle: Duration,
}

impl BehaviorContext {
    pub fn from_config(config: &ServerConfig, port: u16) -> Self {
        Self {
            server: server_header(),
            prefix: config.behaviors.prefix.clone(),
            port,
            wait: WaitResolver::new(config.behaviors.wait()),
            hangup: config.behaviors.hangup(),
            idle: config.timeouts.idle(),
        }
    }

    pub fn server_header_value(&self) -> HeaderValue {
        HeaderValue::from_str(&self.server).unwrap_or(HeaderValue::from_static("wirefault"))
    }

    /// Full request path of a behavior.
    pub fn path_of(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }
}

pub fn server_header() -> String {
    format!("wirefault {}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_from_config() {
        let mut config = ServerConfig::default();
        config.behaviors.wait_secs = 5;
        let ctx = BehaviorContext::from_config(&config, 4242);

        assert_eq!(ctx.port, 4242);
        assert_eq!(ctx.wait.default_wait(), Duration::from_secs(5));
        assert_eq!(ctx.server, format!("wirefault {}", env!("CARGO_PKG_VERSION")));
        assert_eq!(ctx.path_of("get"), "/wirefault/get");
    }
}
