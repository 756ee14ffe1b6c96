use std::convert::Infallible;
use std::net::SocketAddr;

use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::extract::{ConnectInfo, FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use linkhop_core::{Slug, Visit};
use linkhop_redirector::Redirector;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// The visit metadata of the current request.
///
/// The client address is the first hop of `X-Forwarded-For` when present,
/// otherwise the socket peer.
pub struct ClientVisit(pub Visit);

fn header_str(headers: &HeaderMap, name: impl header::AsHeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get(X_FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .map(str::to_string)
}

impl<S: Send + Sync> FromRequestParts<S> for ClientVisit {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        let ip = forwarded_for(&parts.headers).or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(peer)| peer.ip().to_string())
        });

        Ok(Self(Visit {
            ip,
            user_agent: header_str(&parts.headers, header::USER_AGENT),
            referer: header_str(&parts.headers, header::REFERER),
        }))
    }
}

pub async fn redirect_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    ClientVisit(visit): ClientVisit,
) -> Result<Response> {
    let slug = Slug::new(slug).map_err(|_| AppError::NotFound)?;

    let url = state.redirector().resolve(&slug, visit).await?;
    Ok((StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, url)]).into_response())
}
