use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};

use crate::models::auth_model::Claims;

pub struct JwtUtils;

impl JwtUtils {
    /// Sign a token for the given identity, valid for `minutes`.
    /// Identity is normally issued by the IAM collaborator; this is for
    /// operators and tests.
    pub fn generate_jwt(
        subject: &str,
        tenant: Option<&str>,
        roles: Vec<String>,
        permissions: Vec<String>,
        minutes: i64,
        secret: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let expire = now + Duration::minutes(minutes);
        let claims = Claims {
            sub: subject.to_string(),
            tenant: tenant.map(str::to_string),
            roles,
            permissions,
            exp: expire.timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
    }

    /// Validate a JWT token and return the token data
    pub fn validate_jwt(token: &str, secret: &str) -> Result<TokenData<Claims>, jsonwebtoken::errors::Error> {
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;

        decode::<Claims>(token, &decoding_key, &validation)
    }
}
