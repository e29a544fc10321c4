//! Token issuance and verification.
//!
//! Every verification failure collapses to the same
//! `"Invalid or expired token"` error so callers cannot tell a forged
//! token from an expired one.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use schoolboard_config::JwtConfig;
use schoolboard_core::AppError;

use crate::claims::{Claims, RefreshTokenClaims, TokenUse};

const INVALID_TOKEN: &str = "Invalid or expired token";

/// Identity embedded in an access token.
#[derive(Debug, Clone)]
pub struct AccessTokenInput<'a> {
    pub user_id: Uuid,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

fn now() -> usize {
    Utc::now().timestamp().max(0) as usize
}

pub fn create_access_token(
    input: &AccessTokenInput<'_>,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let iat = now();
    let claims = Claims {
        sub: input.user_id.to_string(),
        email: input.email.to_string(),
        first_name: input.first_name.to_string(),
        last_name: input.last_name.to_string(),
        roles: input.roles.clone(),
        token_use: TokenUse::Access,
        exp: iat + jwt_config.access_token_expiry.max(0) as usize,
        iat,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create token: {}", e)))
}

/// HS256 validation with no clock leeway on `exp`.
fn strict_validation() -> Validation {
    let mut validation = Validation::default();
    validation.leeway = 0;
    validation
}

pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &strict_validation(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized(INVALID_TOKEN))?;

    if claims.token_use != TokenUse::Access {
        return Err(AppError::unauthorized(INVALID_TOKEN));
    }

    Ok(claims)
}

pub fn create_refresh_token(
    user_id: Uuid,
    email: &str,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let iat = now();
    let claims = RefreshTokenClaims {
        sub: user_id.to_string(),
        email: email.to_string(),
        token_use: TokenUse::Refresh,
        exp: iat + jwt_config.refresh_token_expiry.max(0) as usize,
        iat,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create refresh token: {}", e)))
}

pub fn verify_refresh_token(
    token: &str,
    jwt_config: &JwtConfig,
) -> Result<RefreshTokenClaims, AppError> {
    let claims = decode::<RefreshTokenClaims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &strict_validation(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized(INVALID_TOKEN))?;

    if claims.token_use != TokenUse::Refresh {
        return Err(AppError::unauthorized(INVALID_TOKEN));
    }

    Ok(claims)
}

pub fn create_token_pair(
    input: &AccessTokenInput<'_>,
    jwt_config: &JwtConfig,
) -> Result<TokenPair, AppError> {
    Ok(TokenPair {
        access_token: create_access_token(input, jwt_config)?,
        refresh_token: create_refresh_token(input.user_id, input.email, jwt_config)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    fn get_test_jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key-for-testing-purposes-only".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 604_800,
        }
    }

    fn input(user_id: Uuid) -> AccessTokenInput<'static> {
        AccessTokenInput {
            user_id,
            email: "office@school.test",
            first_name: "Ada",
            last_name: "Lovelace",
            roles: vec!["office_member".to_string()],
        }
    }

    fn encode_raw<T: Serialize>(claims: &T, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_access_token_round_trip() {
        let config = get_test_jwt_config();
        let user_id = Uuid::new_v4();

        let token = create_access_token(&input(user_id), &config).unwrap();
        let claims = verify_token(&token, &config).unwrap();

        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.email, "office@school.test");
        assert_eq!(claims.roles, vec!["office_member"]);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let config = get_test_jwt_config();
        let token = create_access_token(&input(Uuid::new_v4()), &config).unwrap();

        let other = JwtConfig {
            secret: "a-completely-different-secret-value".to_string(),
            ..config
        };
        let err = verify_token(&token, &other).unwrap_err();
        assert_eq!(err.status.as_u16(), 401);
        assert_eq!(err.error.to_string(), INVALID_TOKEN);
    }

    #[test]
    fn test_garbage_rejected() {
        let config = get_test_jwt_config();
        assert!(verify_token("not.a.jwt", &config).is_err());
        assert!(verify_refresh_token("", &config).is_err());
    }

    #[test]
    fn test_expired_access_token_rejected() {
        let config = get_test_jwt_config();
        let past = now() - 7200;
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "x@y.z".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            roles: vec![],
            token_use: TokenUse::Access,
            exp: past,
            iat: past - 3600,
        };
        let token = encode_raw(&claims, &config.secret);
        assert!(verify_token(&token, &config).is_err());
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let config = get_test_jwt_config();
        let user_id = Uuid::new_v4();

        let token = create_refresh_token(user_id, "a@b.c", &config).unwrap();
        let claims = verify_refresh_token(&token, &config).unwrap();

        assert_eq!(claims.user_id(), Some(user_id));
        assert_eq!(claims.token_use, TokenUse::Refresh);
        assert_eq!(claims.exp - claims.iat, 604_800);
    }

    #[test]
    fn test_refresh_tokens_are_unique() {
        let config = get_test_jwt_config();
        let user_id = Uuid::new_v4();
        let a = create_refresh_token(user_id, "a@b.c", &config).unwrap();
        let b = create_refresh_token(user_id, "a@b.c", &config).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_expired_refresh_token_rejected() {
        let config = get_test_jwt_config();
        let past = now() - 7200;
        let claims = RefreshTokenClaims {
            sub: Uuid::new_v4().to_string(),
            email: "a@b.c".to_string(),
            token_use: TokenUse::Refresh,
            exp: past,
            iat: past - 60,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode_raw(&claims, &config.secret);
        assert!(verify_refresh_token(&token, &config).is_err());
    }

    #[test]
    fn test_just_expired_refresh_token_rejected() {
        let config = get_test_jwt_config();
        let claims = RefreshTokenClaims {
            sub: Uuid::new_v4().to_string(),
            email: "a@b.c".to_string(),
            token_use: TokenUse::Refresh,
            exp: now() - 30,
            iat: now() - 600,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode_raw(&claims, &config.secret);
        let err = verify_refresh_token(&token, &config).unwrap_err();
        assert_eq!(err.status.as_u16(), 401);
    }

    #[test]
    fn test_just_expired_access_token_rejected() {
        let config = get_test_jwt_config();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "x@y.z".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            roles: vec![],
            token_use: TokenUse::Access,
            exp: now() - 30,
            iat: now() - 600,
        };
        let token = encode_raw(&claims, &config.secret);
        assert!(verify_token(&token, &config).is_err());
    }

    #[test]
    fn test_access_token_is_not_a_refresh_token() {
        let config = get_test_jwt_config();
        let access = create_access_token(&input(Uuid::new_v4()), &config).unwrap();
        assert!(verify_refresh_token(&access, &config).is_err());
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let config = get_test_jwt_config();
        let refresh = create_refresh_token(Uuid::new_v4(), "a@b.c", &config).unwrap();
        assert!(verify_token(&refresh, &config).is_err());
    }

    #[test]
    fn test_token_use_marker_enforced() {
        // Same shape as a refresh token but marked as access.
        let config = get_test_jwt_config();
        let claims = RefreshTokenClaims {
            sub: Uuid::new_v4().to_string(),
            email: "a@b.c".to_string(),
            token_use: TokenUse::Access,
            exp: now() + 600,
            iat: now(),
            jti: "j".to_string(),
        };
        let token = encode_raw(&claims, &config.secret);
        assert!(verify_refresh_token(&token, &config).is_err());
    }

    #[test]
    fn test_token_pair() {
        let config = get_test_jwt_config();
        let pair = create_token_pair(&input(Uuid::new_v4()), &config).unwrap();
        assert!(verify_token(&pair.access_token, &config).is_ok());
        assert!(verify_refresh_token(&pair.refresh_token, &config).is_ok());
    }
}
