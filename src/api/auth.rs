use mongodb::bson::doc;
use rocket::{
    http::{Cookie, CookieJar, Status},
    serde::json::Json,
    Route, State,
};

use crate::{
    config::Config,
    error::{Error, Result},
    model::{
        api::auth::{AdminCredentials, AuthToken, AUTH_TOKEN_COOKIE},
        db::admin::{email_is_allowed, Admin},
        mongodb::Coll,
    },
};

pub fn routes() -> Vec<Route> {
    routes![authenticate, logout]
}

#[post("/auth/admin", data = "<credentials>", format = "json")]
async fn authenticate(
    cookies: &CookieJar<'_>,
    credentials: Json<AdminCredentials>,
    admins: Coll<Admin>,
    config: &State<Config>,
) -> Result<()> {
    // The allow-list is enforced here, at the service boundary.
    if !email_is_allowed(&credentials.email) {
        return Err(Error::unauthorized(format!(
            "{} is not an administrator",
            credentials.email
        )));
    }

    let with_email = doc! {
        "email": &credentials.email,
    };
    let admin = admins
        .find_one(with_email, None)
        .await?
        .filter(|admin| admin.verify_password(&credentials.password))
        .ok_or_else(|| {
            Error::unauthorized(
                "No admin found with the provided email and password combination".to_string(),
            )
        })?;

    let token = AuthToken::new(&admin);
    cookies.add(token.into_cookie(config));

    Ok(())
}

#[delete("/auth")]
fn logout(cookies: &CookieJar) -> Status {
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
    Status::Ok
}
