use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request, Response},
    middleware::Next,
};

// JSON API: nothing is framed or scripted. Avatars and banners come from the Twitter image CDN.
const CSP: &str = "default-src 'none'; img-src 'self' https://pbs.twimg.com https://abs.twimg.com; object-src 'none'; base-uri 'none'; form-action 'self'; frame-ancestors 'none'";

/// Add security headers to every response unless a handler already set them.
pub async fn csp_middleware(req: Request<Body>, next: Next) -> Response<Body> {
    let mut res = next.run(req).await;

    for (name, value) in [
        ("content-security-policy", CSP),
        ("referrer-policy", "no-referrer"),
        ("x-content-type-options", "nosniff"),
    ] {
        if !res.headers().contains_key(name) {
            res.headers_mut()
                .insert(HeaderName::from_static(name), HeaderValue::from_static(value));
        }
    }

    res
}
