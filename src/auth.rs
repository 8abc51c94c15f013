use std::str::FromStr;

use axum::{
    extract::{Query, Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use jsonwebtoken::{decode, DecodingKey, TokenData, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_number_from_string;
use uuid::Uuid;

use crate::error::ApiError;

/// Session token claims as issued by the identity provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub exp: u64,
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Browsers cannot set headers when opening a WebSocket, so the feed also
/// accepts the token as a query parameter.
#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

pub async fn auth_middleware(
    State(signing_key): State<Secret<String>>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    query: Option<Query<TokenQuery>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // An unreadable query string counts as carrying no token.
    let query_token = query.and_then(|Query(query)| query.token);
    let token_string = match (&bearer, &query_token) {
        (Some(TypedHeader(authorization)), _) => authorization.token(),
        (None, Some(token)) => token.as_str(),
        (None, None) => {
            return Err(ApiError::Unauthorized("bearer token missing".to_string()));
        }
    };

    let user = authenticate(token_string, &signing_key)?;
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Verifies a session token and resolves the user it was issued to.
pub fn authenticate(token: &str, signing_key: &Secret<String>) -> Result<User, ApiError> {
    let token = decode_jwt(token, signing_key).map_err(|e| {
        tracing::warn!(?e, "JWT decoding error");
        ApiError::Unauthorized("invalid token".to_string())
    })?;

    let id = Uuid::from_str(&token.claims.sub)
        .map_err(|_| ApiError::Unauthorized("subject is not a user id".to_string()))?;

    Ok(User {
        id,
        email: token.claims.email,
    })
}

fn decode_jwt(
    token: &str,
    signing_key: &Secret<String>,
) -> jsonwebtoken::errors::Result<TokenData<Claims>> {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_aud = false;
    decode(
        token,
        &DecodingKey::from_secret(signing_key.expose_secret().as_ref()),
        &validation,
    )
}
