//! Access token guard.
//!
//! Extracts the bearer token from the Authorization header, validates it as
//! an access token and injects the claims into request extensions. A
//! missing header, a malformed prefix, a bad signature and an expired token
//! all surface as the same 401 body; the concrete reason is only logged.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage, HttpResponse,
};
use chrono::Utc;
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{Claims, TokenCodec, TokenKind};

pub struct AccessGuard {
    codec: TokenCodec,
}

impl AccessGuard {
    pub fn new(codec: TokenCodec) -> Self {
        Self { codec }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AccessGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AccessGuardService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AccessGuardService {
            service: Rc::new(service),
            codec: self.codec.clone(),
        }))
    }
}

pub struct AccessGuardService<S> {
    service: Rc<S>,
    codec: TokenCodec,
}

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(serde_json::json!({
        "error": "invalid or missing credentials",
        "code": "UNAUTHORIZED"
    }))
}

fn reject<R>(response: HttpResponse) -> LocalBoxFuture<'static, Result<R, Error>> {
    Box::pin(async move {
        Err(actix_web::error::InternalError::from_response("unauthorized", response).into())
    })
}

impl<S, B> Service<ServiceRequest> for AccessGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let bearer = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::to_owned);

        let token = match bearer {
            Some(token) => token,
            None => {
                tracing::warn!("missing or malformed authorization header");
                return reject(unauthorized());
            }
        };

        match self.codec.parse(&token, TokenKind::Access, Utc::now()) {
            Ok(Claims::Access(claims)) => {
                tracing::debug!(user_id = claims.sub, "access token accepted");
                req.extensions_mut().insert(claims);

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Ok(Claims::Refresh(_)) => {
                // parse() cannot return refresh claims for the access kind
                tracing::error!("access parse yielded refresh claims");
                reject(unauthorized())
            }
            Err(e) => {
                tracing::warn!(reason = %e, "access token rejected");
                reject(unauthorized())
            }
        }
    }
}
