use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session cookie payload. Identity only, the role is read from the user row on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub exp: i64,
}

impl UserClaims {
    pub fn new(user_id: Uuid, ttl: Duration) -> Self {
        Self {
            sub: user_id.to_string(),
            exp: (Utc::now() + ttl).timestamp(),
        }
    }
}

pub fn generate_token<K: AsRef<[u8]>>(
    claims: UserClaims,
    key: K,
) -> jsonwebtoken::errors::Result<String> {
    let header = Header::default();
    let key = EncodingKey::from_secret(key.as_ref());

    let token = jsonwebtoken::encode(&header, &claims, &key)?;
    Ok(token)
}

pub fn process_token<K: AsRef<[u8]>>(
    token: &str,
    key: K,
) -> jsonwebtoken::errors::Result<TokenData<UserClaims>> {
    let validation = Validation::default();
    let key = DecodingKey::from_secret(key.as_ref());

    let claims = jsonwebtoken::decode::<UserClaims>(token, &key, &validation)?;
    Ok(claims)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn token_roundtrip_test() {
        let user_id = Uuid::new_v4();
        let token = generate_token(UserClaims::new(user_id, Duration::hours(1)), "secret").unwrap();

        let data = process_token(&token, "secret").unwrap();
        assert_eq!(data.claims.sub, user_id.to_string());
    }

    #[test]
    fn token_wrong_key_test() {
        let token =
            generate_token(UserClaims::new(Uuid::new_v4(), Duration::hours(1)), "secret").unwrap();
        assert!(process_token(&token, "other").is_err());
    }

    #[test]
    fn token_expired_test() {
        let token =
            generate_token(UserClaims::new(Uuid::new_v4(), Duration::hours(-2)), "secret").unwrap();
        assert!(process_token(&token, "secret").is_err());
    }
}
