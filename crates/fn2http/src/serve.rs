//! Axum serving adapter.
//!
//! Bridges an assembled [`App`] to axum: every route-table entry becomes an
//! axum route whose handler rebuilds the core [`Request`] from the incoming
//! parts and converts the core [`Response`] back.

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::Query;
use axum::http::HeaderMap;
use axum::routing;

use fn2http_core::http::Method;
use fn2http_core::{App, Request, Response, RouteHandler};

fn into_axum_response(resp: Response) -> axum::response::Response {
    let mut out = axum::response::Response::new(axum::body::Body::from(resp.body));
    *out.status_mut() = resp.status;
    *out.headers_mut() = resp.headers;
    out
}

fn route_to_axum(method: Method, path: String, handler: RouteHandler) -> routing::MethodRouter {
    let request_method = method.clone();
    let axum_handler = move |headers: HeaderMap,
                             Query(query): Query<Vec<(String, String)>>,
                             body: Bytes| {
        let handler = Arc::clone(&handler);
        let method = request_method.clone();
        let path = path.clone();
        async move {
            let mut req = Request::new(method, path);
            *req.headers_mut() = headers;
            let mut req = req.body(body.to_vec());
            for (key, value) in query {
                req = req.query(key, value);
            }
            into_axum_response(handler(&req))
        }
    };

    if method == Method::GET {
        routing::get(axum_handler)
    } else if method == Method::PUT {
        routing::put(axum_handler)
    } else if method == Method::DELETE {
        routing::delete(axum_handler)
    } else {
        routing::post(axum_handler)
    }
}

/// Convert an assembled app into an axum router.
pub fn into_router(app: Arc<App>) -> Router {
    let mut router = Router::new();
    for (method, path, handler) in app.route_table() {
        let mount_path = path.clone();
        router = router.route(&mount_path, route_to_axum(method, path, handler));
    }
    router
}

/// Bind and serve a router until the task is cancelled.
pub async fn serve(router: Router, addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await
}
