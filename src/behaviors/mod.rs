//! Behavior registry.
//!
//! # Data Flow
//! ```text
//! registry() (immutable, built once)
//!     → Registry::classify(request head)   [connection dispatcher]
//!         Raw      → raw.rs writes literal bytes on the bare transport
//!         Upgrade  → hyper with upgrades   → http::websocket
//!         Standard → hyper, one request    → axum router
//!     → Registry::router()                 [axum routes for the rest]
//! ```
//!
//! # Design Decisions
//! - Each behavior declares up front whether it needs the raw transport,
//!   an upgradable connection, or neither
//! - Raw behaviors are never reachable through axum; the router only
//!   answers them with 405 for methods they do not accept

pub mod context;
pub mod delay;
pub mod encoded;
pub mod forms;
pub mod jwks;
pub mod raw;
pub mod simple;

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::header::SERVER;
use axum::http::Method;
use axum::routing::{any, on, MethodFilter, MethodRouter};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::RequestBodyTimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::http::response;
use crate::http::server::AppState;
use crate::http::websocket;
use crate::net::RequestHead;

pub use context::BehaviorContext;
pub use raw::RawBehavior;

/// Builds the method router for a behavior from its method filter.
pub type RouteFn = fn(MethodFilter) -> MethodRouter<AppState>;

/// What a behavior needs from the connection.
#[derive(Clone, Copy)]
pub enum BehaviorHandler {
    /// Ordinary axum handler.
    Structured(RouteFn),
    /// Axum handler that upgrades the connection.
    Upgrade(RouteFn),
    /// Writes literal bytes on the bare transport.
    Raw(RawBehavior),
}

/// A named behavior reachable at `<prefix><name>`.
#[derive(Clone)]
pub struct BehaviorSpec {
    pub name: &'static str,
    /// Accepted methods; empty means any.
    pub methods: Vec<Method>,
    pub handler: BehaviorHandler,
}

impl BehaviorSpec {
    fn new(name: &'static str, methods: &[Method], handler: BehaviorHandler) -> Self {
        Self {
            name,
            methods: methods.to_vec(),
            handler,
        }
    }

    pub fn allows(&self, method: &Method) -> bool {
        self.methods.is_empty() || self.methods.contains(method)
    }

    /// The axum filter for the accepted methods.
    pub fn method_filter(&self) -> MethodFilter {
        let methods: &[Method] = if self.methods.is_empty() {
            &ALL_METHODS
        } else {
            &self.methods
        };
        methods
            .iter()
            .filter_map(|m| MethodFilter::try_from(m.clone()).ok())
            .reduce(MethodFilter::or)
            .unwrap_or(MethodFilter::GET)
    }
}

static ALL_METHODS: [Method; 8] = [
    Method::DELETE,
    Method::GET,
    Method::HEAD,
    Method::OPTIONS,
    Method::PATCH,
    Method::POST,
    Method::PUT,
    Method::TRACE,
];

/// Every behavior the server knows, in no particular order.
pub fn registry() -> Vec<BehaviorSpec> {
    use BehaviorHandler::{Raw, Structured, Upgrade};
    use Method as M;

    vec![
        BehaviorSpec::new("get", &[M::GET], Structured(|f| on(f, simple::get))),
        BehaviorSpec::new("post", &[M::POST], Structured(|f| on(f, simple::post))),
        BehaviorSpec::new("put", &[M::PUT], Structured(|f| on(f, simple::put))),
        BehaviorSpec::new("patch", &[M::PATCH], Structured(|f| on(f, simple::patch))),
        BehaviorSpec::new("delete", &[M::DELETE], Structured(|f| on(f, simple::delete))),
        BehaviorSpec::new("options", &[M::OPTIONS], Structured(|f| on(f, simple::options))),
        BehaviorSpec::new("trace", &[M::TRACE], Structured(|f| on(f, simple::trace))),
        BehaviorSpec::new("getorhead", &[M::GET, M::HEAD], Structured(|f| on(f, simple::get_or_head))),
        BehaviorSpec::new("echoquery", &[M::GET], Structured(|f| on(f, simple::echo_query))),
        BehaviorSpec::new("echoport", &[M::GET], Structured(|f| on(f, simple::echo_port))),
        BehaviorSpec::new("echoheader", &[M::GET], Structured(|f| on(f, simple::echo_header))),
        BehaviorSpec::new("redirected", &[], Structured(|f| on(f, simple::redirected))),
        BehaviorSpec::new("send", &[], Structured(|f| on(f, simple::send))),
        BehaviorSpec::new("nocontentenc", &[], Structured(|f| on(f, simple::no_content_encoding))),
        BehaviorSpec::new("unknowncontentenc", &[], Structured(|f| on(f, simple::unknown_content_encoding))),
        BehaviorSpec::new("tinyidentity", &[], Structured(|f| on(f, encoded::tiny_identity))),
        BehaviorSpec::new("tinygzip", &[], Structured(|f| on(f, encoded::tiny_gzip))),
        BehaviorSpec::new("gzip", &[], Structured(|f| on(f, encoded::gzip))),
        BehaviorSpec::new("deflate", &[], Structured(|f| on(f, encoded::deflate))),
        BehaviorSpec::new("brotli", &[], Structured(|f| on(f, encoded::brotli))),
        BehaviorSpec::new("badgzip", &[], Structured(|f| on(f, encoded::bad_gzip))),
        BehaviorSpec::new("choose", &[], Structured(|f| on(f, encoded::choose))),
        BehaviorSpec::new("slowheader", &[], Structured(|f| on(f, delay::slow_header))),
        BehaviorSpec::new("chunked", &[], Structured(|f| on(f, delay::chunked))),
        BehaviorSpec::new("jwks", &[], Structured(|f| on(f, jwks::jwks))),
        BehaviorSpec::new("jwksbad", &[], Structured(|f| on(f, jwks::jwks_bad))),
        BehaviorSpec::new("jwksmix", &[], Structured(|f| on(f, jwks::jwks_mix))),
        BehaviorSpec::new("jwkses256", &[], Structured(|f| on(f, jwks::jwks_es256))),
        BehaviorSpec::new("jwksrotate", &[], Structured(|f| on(f, jwks::jwks_rotate))),
        BehaviorSpec::new("jwksbadrotate", &[], Structured(|f| on(f, jwks::jwks_bad_rotate))),
        BehaviorSpec::new("formget", &[M::GET], Structured(|f| on(f, forms::form_get))),
        BehaviorSpec::new("formpost", &[M::POST], Structured(|f| on(f, forms::form_post))),
        BehaviorSpec::new("websocket", &[M::GET], Upgrade(|f| on(f, websocket::websocket))),
        BehaviorSpec::new("slowbody", &[], Raw(RawBehavior::SlowBody)),
        BehaviorSpec::new("badcontentlength", &[], Raw(RawBehavior::BadContentLength)),
        BehaviorSpec::new("hangupduringheader", &[], Raw(RawBehavior::HangupDuringHeader)),
        BehaviorSpec::new("hangupafterheader", &[], Raw(RawBehavior::HangupAfterHeader)),
        BehaviorSpec::new("hangupduringbody", &[], Raw(RawBehavior::HangupDuringBody)),
        BehaviorSpec::new("connect", &[M::CONNECT], Raw(RawBehavior::Connect)),
    ]
}

/// How the dispatcher should serve a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Raw(RawBehavior),
    Upgrade,
    Standard,
}

/// The registered behaviors, keyed by full request path.
pub struct Registry {
    ctx: Arc<BehaviorContext>,
    specs: HashMap<String, BehaviorSpec>,
}

impl Registry {
    pub fn new(ctx: Arc<BehaviorContext>, specs: Vec<BehaviorSpec>) -> Self {
        let specs = specs
            .into_iter()
            .map(|spec| (ctx.path_of(spec.name), spec))
            .collect();
        Self { ctx, specs }
    }

    pub fn context(&self) -> &Arc<BehaviorContext> {
        &self.ctx
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn lookup(&self, path: &str) -> Option<&BehaviorSpec> {
        self.specs.get(path)
    }

    /// Decide who serves a connection from its first request head.
    pub fn classify(&self, head: &RequestHead) -> Dispatch {
        match self.lookup(head.path()).map(|spec| (spec, spec.handler)) {
            Some((spec, BehaviorHandler::Raw(behavior))) if spec.allows(&head.method) => {
                Dispatch::Raw(behavior)
            }
            Some((_, BehaviorHandler::Upgrade(_))) => Dispatch::Upgrade,
            _ => Dispatch::Standard,
        }
    }

    /// The axum router for every behavior served through hyper.
    pub fn router(&self, state: AppState) -> Router {
        let mut router = Router::new();
        for (path, spec) in &self.specs {
            let route = match spec.handler {
                BehaviorHandler::Structured(build) | BehaviorHandler::Upgrade(build) => {
                    build(spec.method_filter()).fallback(response::method_not_allowed)
                }
                BehaviorHandler::Raw(_) => any(response::method_not_allowed),
            };
            router = router.route(path, route);
        }

        router
            .fallback(response::not_found)
            .with_state(state)
            .layer(SetResponseHeaderLayer::overriding(
                SERVER,
                self.ctx.server_header_value(),
            ))
            .layer(RequestBodyTimeoutLayer::new(self.ctx.idle))
            .layer(TraceLayer::new_for_http())
    }
}
