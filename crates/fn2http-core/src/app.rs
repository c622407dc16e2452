//! Sub-app merging and the assembled application.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use http::{Method, StatusCode};
use serde_json::Value;

use fn2http_openapi::AuthDeclaration;

use crate::config::Config;
use crate::error::BuildError;
use crate::middleware::{Middleware, Next};
use crate::openapi;
use crate::request::{Request, Response};
use crate::route::{RouteSpec, build_route};
use crate::signature::{Callable, FnEndpoint, Signature};

/// A named group of handlers plus sub-app-level middleware.
pub struct SubAppSpec {
    name: String,
    prefix: Option<String>,
    handlers: Vec<Arc<dyn Callable>>,
    middleware: Vec<Arc<dyn Middleware>>,
    retired: Vec<(Method, String)>,
}

impl SubAppSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: None,
            handlers: Vec::new(),
            middleware: Vec::new(),
            retired: Vec::new(),
        }
    }

    /// Mount this sub-app's routes under a path prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn handler(mut self, handler: Arc<dyn Callable>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Sugar for adding a [`FnEndpoint`].
    pub fn endpoint(self, endpoint: FnEndpoint) -> Self {
        self.handler(Arc::new(endpoint))
    }

    pub fn middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Explicitly retire an earlier sub-app's route so this spec may replace
    /// it. Without this, a (method, path) collision fails assembly.
    pub fn retire(mut self, method: Method, path: impl Into<String>) -> Self {
        self.retired.push((method, path.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

struct AppRoute {
    spec: RouteSpec,
    middleware: Arc<[Arc<dyn Middleware>]>,
}

/// The assembled application: a merged route table, app-level metadata, and
/// a lazily computed OpenAPI document.
pub struct App {
    title: String,
    version: String,
    base_url: String,
    publish_openapi: bool,
    auth: Option<AuthDeclaration>,
    routes: Vec<AppRoute>,
    openapi_cache: OnceLock<Value>,
}

/// A handler function the serving layer can invoke per request.
pub type RouteHandler = Arc<dyn Fn(&Request) -> Response + Send + Sync>;

fn ping_endpoint() -> FnEndpoint {
    FnEndpoint::new("ping", Signature::empty(), |_| {
        Ok(serde_json::json!({"ping": "pong"}))
    })
    .http_method("get")
    .route("/ping")
    .with_attr("result_field", Value::Null)
    .summary("Liveness check")
}

/// Merge sub-app specs into one application.
///
/// Fails with [`BuildError::DuplicateRoute`] when two routes resolve to the
/// same (method, path) pair, unless the earlier one was retired via
/// [`SubAppSpec::retire`]. Sub-app names must be unique.
pub fn build_app(specs: Vec<SubAppSpec>, config: &Config) -> Result<App, BuildError> {
    fn add_route(
        route: RouteSpec,
        middleware: Arc<[Arc<dyn Middleware>]>,
        retired: &[(Method, String)],
        routes: &mut Vec<AppRoute>,
        index: &mut HashMap<(Method, String), usize>,
    ) -> Result<(), BuildError> {
        let key = (route.method().clone(), route.path().to_string());
        if let Some(&slot) = index.get(&key) {
            if retired.contains(&key) {
                routes[slot] = AppRoute { spec: route, middleware };
                return Ok(());
            }
            return Err(BuildError::DuplicateRoute {
                method: key.0.to_string(),
                path: key.1,
            });
        }
        index.insert(key, routes.len());
        routes.push(AppRoute { spec: route, middleware });
        Ok(())
    }

    let mut seen_names: Vec<String> = Vec::new();
    let mut routes: Vec<AppRoute> = Vec::new();
    let mut index: HashMap<(Method, String), usize> = HashMap::new();

    for spec in specs {
        if seen_names.contains(&spec.name) {
            return Err(BuildError::Configuration {
                key: format!("duplicate sub-app name '{}'", spec.name),
            });
        }
        seen_names.push(spec.name.clone());

        let middleware: Arc<[Arc<dyn Middleware>]> = spec.middleware.into();
        let prefix = spec.prefix.unwrap_or_default();
        for handler in spec.handlers {
            let route = build_route(handler, config)?.with_path_prefix(&prefix);
            add_route(route, Arc::clone(&middleware), &spec.retired, &mut routes, &mut index)?;
        }
    }

    // Auto-mounted liveness route
    let ping = build_route(Arc::new(ping_endpoint()), config)?;
    let no_middleware: Arc<[Arc<dyn Middleware>]> = Arc::from(Vec::new());
    add_route(ping, no_middleware, &[], &mut routes, &mut index)?;

    let host = config
        .resolve_app_str("host")
        .unwrap_or_else(|| "localhost".to_string());
    let port = config
        .resolve_app("port")
        .and_then(|v| v.as_u64())
        .unwrap_or(3030);
    let protocol = if port == 443 { "https" } else { "http" };

    Ok(App {
        title: config
            .resolve_app_str("title")
            .unwrap_or_else(|| "HTTP Service".to_string()),
        version: config
            .resolve_app_str("version")
            .unwrap_or_else(|| "0.1.0".to_string()),
        base_url: format!("{protocol}://{host}:{port}"),
        publish_openapi: config
            .resolve_app("publish_openapi")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        auth: None,
        routes,
        openapi_cache: OnceLock::new(),
    })
}

impl App {
    /// Attach an auth declaration to the generated API document. Must be
    /// called before the document is first accessed.
    pub fn with_auth(mut self, auth: AuthDeclaration) -> Self {
        self.auth = Some(auth);
        self.openapi_cache = OnceLock::new();
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn auth(&self) -> Option<&AuthDeclaration> {
        self.auth.as_ref()
    }

    /// The merged routes, in mount order.
    pub fn routes(&self) -> impl Iterator<Item = &RouteSpec> {
        self.routes.iter().map(|r| &r.spec)
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// The OpenAPI document, computed on first access and cached.
    pub fn openapi_spec(&self) -> &Value {
        self.openapi_cache
            .get_or_init(|| openapi::emit(self, self.auth.as_ref()))
    }

    /// Dispatch one request: route lookup, middleware chain, then the
    /// route's own pipeline. Unknown paths get a JSON 404.
    pub fn handle(&self, req: &Request) -> Response {
        if self.publish_openapi && req.method() == Method::GET && req.path() == "/openapi" {
            return Response::ok_json(self.openapi_spec());
        }

        match self
            .routes
            .iter()
            .find(|r| r.spec.method() == req.method() && r.spec.path() == req.path())
        {
            Some(route) => Next::new(&route.spec, &route.middleware).run(req),
            None => Response::error_json(
                StatusCode::NOT_FOUND,
                &format!("no route for {} {}", req.method(), req.path()),
            ),
        }
    }

    /// Export the route table as (method, path, handler) triples for the
    /// serving layer. Includes the `/openapi` route when publishing is on.
    pub fn route_table(self: &Arc<Self>) -> Vec<(Method, String, RouteHandler)> {
        let mut table: Vec<(Method, String, RouteHandler)> = Vec::new();
        for entry in &self.routes {
            let app = Arc::clone(self);
            let method = entry.spec.method().clone();
            let path = entry.spec.path().to_string();
            let request_path = path.clone();
            let request_method = method.clone();
            table.push((
                method,
                path,
                Arc::new(move |req: &Request| {
                    // Route identity is fixed by the table entry
                    debug_assert!(req.method() == &request_method && req.path() == request_path);
                    app.handle(req)
                }),
            ));
        }
        if self.publish_openapi {
            let app = Arc::clone(self);
            table.push((
                Method::GET,
                "/openapi".to_string(),
                Arc::new(move |_req: &Request| Response::ok_json(app.openapi_spec())),
            ));
        }
        table
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("title", &self.title)
            .field("routes", &self.routes.len())
            .finish_non_exhaustive()
    }
}
