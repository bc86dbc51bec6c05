// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Middleware module for HTTP request processing
//!
//! This module builds the CORS policy from configuration. Request ids, tracing
//! spans and the request timeout are layered in [`crate::server`].

use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer, ExposeHeaders};
use tracing::debug;

use crate::{
    config::CorsConfig,
    error::{ServerError, ServerResult},
};

const WILDCARD: &str = "*";

fn is_wildcard(values: &[String]) -> bool {
    values.iter().any(|value| value.trim() == WILDCARD)
}

fn config_error(message: String) -> ServerError {
    ServerError::Config { message }
}

/// Build the CORS layer described by `config`
///
/// A `*` entry allows anything. Browsers refuse wildcards on credentialed
/// requests, so with `allow_credentials` a wildcard origin, method or header
/// list mirrors the request instead.
///
/// # Errors
///
/// Returns `ServerError::Config` if an origin, method or header is not a valid
/// HTTP token, or if exposed headers are a wildcard while credentials are allowed.
pub fn cors_layer(config: &CorsConfig) -> ServerResult<CorsLayer> {
    let credentials = config.allow_credentials;

    let origins = if is_wildcard(&config.allowed_origins) {
        if credentials {
            AllowOrigin::mirror_request()
        } else {
            AllowOrigin::any()
        }
    } else {
        let origins = config
            .allowed_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin.trim())
                    .map_err(|e| config_error(format!("invalid CORS origin {origin:?}: {e}")))
            })
            .collect::<ServerResult<Vec<_>>>()?;
        AllowOrigin::list(origins)
    };

    let methods = if is_wildcard(&config.allowed_methods) {
        if credentials {
            AllowMethods::mirror_request()
        } else {
            AllowMethods::any()
        }
    } else {
        let methods = config
            .allowed_methods
            .iter()
            .map(|method| {
                Method::from_bytes(method.trim().to_uppercase().as_bytes())
                    .map_err(|e| config_error(format!("invalid CORS method {method:?}: {e}")))
            })
            .collect::<ServerResult<Vec<_>>>()?;
        AllowMethods::list(methods)
    };

    let headers = if is_wildcard(&config.allowed_headers) {
        if credentials {
            AllowHeaders::mirror_request()
        } else {
            AllowHeaders::any()
        }
    } else {
        AllowHeaders::list(parse_header_names(&config.allowed_headers)?)
    };

    let exposed = if is_wildcard(&config.exposed_headers) {
        if credentials {
            return Err(config_error(
                "CORS exposed headers cannot be '*' when credentials are allowed".to_string(),
            ));
        }
        ExposeHeaders::any()
    } else {
        ExposeHeaders::list(parse_header_names(&config.exposed_headers)?)
    };

    debug!(?config, "configured CORS policy");

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers)
        .expose_headers(exposed)
        .allow_credentials(credentials))
}

fn parse_header_names(names: &[String]) -> ServerResult<Vec<HeaderName>> {
    names
        .iter()
        .map(|name| {
            HeaderName::from_bytes(name.trim().as_bytes())
                .map_err(|e| config_error(format!("invalid CORS header {name:?}: {e}")))
        })
        .collect()
}
