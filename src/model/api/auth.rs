use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use rocket::{
    http::{Cookie, SameSite, Status},
    outcome::{try_outcome, IntoOutcome},
    request::{FromRequest, Outcome},
    time::Duration,
    Request, State,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Error;
use crate::model::{
    db::admin::Admin,
    mongodb::{Coll, Id},
};

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

/// Login credentials for an admin.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminCredentials {
    pub email: String,
    pub password: String,
}

/// An authentication token representing a signed-in admin.
#[derive(Serialize, Deserialize)]
pub struct AuthToken {
    pub id: Id,
}

impl AuthToken {
    /// Create a new [`AuthToken`] for the given admin.
    pub fn new(admin: &Admin) -> Self {
        Self { id: admin.id }
    }

    /// Serialize this token into a cookie.
    pub fn into_cookie(self, config: &Config) -> Cookie<'static> {
        let claims = Claims {
            token: self,
            expire_at: Utc::now() + config.auth_ttl(),
        };

        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )
        .expect("JWT encoding is infallible with default settings");

        Cookie::build(AUTH_TOKEN_COOKIE, token)
            .max_age(Duration::seconds(config.auth_ttl().num_seconds()))
            .http_only(true)
            .same_site(SameSite::Strict)
            .finish()
    }

    /// Deserialize a token from a cookie.
    pub fn from_cookie(cookie: &Cookie<'static>, config: &Config) -> Result<Self, Error> {
        let token = jsonwebtoken::decode(
            cookie.value(),
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims>| claims.claims.token)?;
        Ok(token)
    }
}

/// Cookie claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    token: AuthToken,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthToken {
    type Error = Error;

    /// Get an [`AuthToken`] from the cookie and verify that the admin it
    /// represents still exists.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        // Unwrap is safe as `Config` is always managed.
        let config = req.guard::<&State<Config>>().await.unwrap();

        // Forward to any routes that do not require an authentication token.
        let cookie = try_outcome!(req.cookies().get(AUTH_TOKEN_COOKIE).or_forward(()));

        // Decode the token.
        let token: Self = try_outcome!(Self::from_cookie(cookie, config).or_forward(()));

        // Check the admin actually exists.
        let db = req.guard::<&State<mongodb::Database>>().await.unwrap();
        let admin = Coll::<Admin>::from_db(db)
            .find_one(token.id.as_doc(), None)
            .await;
        match admin {
            Ok(Some(_)) => Outcome::Success(token),
            Ok(None) => Outcome::Forward(()),
            Err(e) => Outcome::Failure((Status::InternalServerError, e.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::model::db::admin::AdminCore;

    use super::*;

    fn example_admin() -> Admin {
        Admin {
            id: Id::new(),
            admin: AdminCore::new("admin@voting.com".to_string(), "hunter2"),
        }
    }

    #[test]
    fn cookie_round_trips() {
        let config = Config::example();
        let admin = example_admin();

        let token = AuthToken::new(&admin);
        let cookie = token.into_cookie(&config);
        let decoded = AuthToken::from_cookie(&cookie, &config).unwrap();

        assert_eq!(decoded.id, admin.id);
    }

    #[test]
    fn rejects_tokens_signed_with_another_key() {
        let admin = example_admin();

        let cookie = AuthToken::new(&admin).into_cookie(&Config::example());
        let decoded = AuthToken::from_cookie(&cookie, &Config::example2());

        assert!(decoded.is_err());
    }

    #[test]
    fn rejects_tampered_cookies() {
        let config = Config::example();
        let admin = example_admin();

        let cookie = AuthToken::new(&admin).into_cookie(&config);
        let tampered = Cookie::new(AUTH_TOKEN_COOKIE, format!("{}x", cookie.value()));

        assert!(AuthToken::from_cookie(&tampered, &config).is_err());
    }
}
