//! Current user service
//!
//! Resolves the caller of a request to a user, based on the bearer token in the Authorization
//! header. Credentials are only checked when a token is issued, never here.

use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

use axum::Extension;
use axum::RequestPartsExt;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::api::Error;
use crate::storage::Storage;
use crate::users::User;

/// How long an access token is valid, in seconds
const TOKEN_LIFETIME: i64 = 3600;

/// The keys used for encoding/decoding JWT tokens
#[derive(Clone)]
pub struct JwtKeys {
    /// The encoding key
    encoding: EncodingKey,

    /// The decoding key
    decoding: DecodingKey,
}

impl JwtKeys {
    /// Create new encoding/decoding keys, derived from a secret
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// The JWT claims to identify a user
#[derive(Debug, Deserialize, Serialize)]
struct Claims {
    /// The user ID
    sub: Uuid,

    /// When the token expires, as a UNIX timestamp
    exp: i64,

    /// The session ID, changing it invalidates all tokens of the user
    jti: Uuid,
}

/// Token information served to the user
#[derive(Debug, Serialize)]
pub struct Token {
    /// Type of the token: Bearer
    #[allow(clippy::struct_field_names)]
    token_type: String,

    /// In how many seconds does the token expire
    expires_in: i64,

    /// The access token to provide to follow up requests in the Authorization header
    #[allow(clippy::struct_field_names)]
    access_token: String,
}

impl Token {
    /// Create a new token response
    fn new(access_token: String, expires_in: i64) -> Self {
        Self {
            token_type: "Bearer".to_string(),
            expires_in,
            access_token,
        }
    }
}

/// The identified caller of a request
///
/// Rejects the request with `401 Unauthorized` when the caller can not be identified
pub struct CurrentUser<S: Storage> {
    /// The actual user
    user: Arc<User>,

    /// The storage the user was found in
    storage: PhantomData<fn() -> S>,
}

impl<S: Storage> CurrentUser<S> {
    /// Create the current user from a user
    fn new(user: User) -> Self {
        Self {
            user: Arc::new(user),
            storage: PhantomData,
        }
    }
}

impl<S: Storage> Deref for CurrentUser<S> {
    type Target = User;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

/// Generate a token for the outside world for a given user
pub fn generate_token(jwt_keys: &JwtKeys, user: &User) -> Result<Token, Error> {
    use jsonwebtoken::Header;
    use jsonwebtoken::encode;

    let claims = Claims {
        sub: user.id,
        exp: chrono::Utc::now().timestamp() + TOKEN_LIFETIME,
        jti: user.session_id,
    };

    let access_token = encode(&Header::default(), &claims, &jwt_keys.encoding)
        .map_err(Error::internal_server_error)?;

    Ok(Token::new(access_token, TOKEN_LIFETIME))
}

impl<B, S> FromRequestParts<B> for CurrentUser<S>
where
    B: Send + Sync,
    S: Storage,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &B) -> Result<Self, Self::Rejection> {
        use jsonwebtoken::Validation;
        use jsonwebtoken::decode;

        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| Error::unauthorized("Missing API token"))?;

        let Extension(jwt_keys) = parts
            .extract::<Extension<JwtKeys>>()
            .await
            .map_err(|_| Error::internal_server_error("Could not get JWT keys"))?;

        let Extension(storage) = parts
            .extract::<Extension<S>>()
            .await
            .map_err(|_| Error::internal_server_error("Could not get the storage"))?;

        let token_data =
            decode::<Claims>(bearer.token(), &jwt_keys.decoding, &Validation::default())
                .map_err(|err| Error::unauthorized(format!("Invalid token: {err}")))?;

        let claims = token_data.claims;

        let user = storage
            .find_single_user_by_id(&claims.sub)
            .await
            .map_err(Error::internal_server_error)?
            .ok_or_else(|| Error::unauthorized("Could not find user"))?;

        // tokens of an older session are no longer valid
        if claims.jti != user.session_id {
            return Err(Error::unauthorized("Token expired"));
        }

        Ok(CurrentUser::new(user))
    }
}
