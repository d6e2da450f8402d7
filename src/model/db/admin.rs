use std::ops::{Deref, DerefMut};

use mongodb::bson::doc;
use serde::{Deserialize, Serialize};

use crate::model::mongodb::{Coll, Id};

/// The only identities allowed to administer polls. Enforced here at the
/// service boundary; any client-side check is purely cosmetic.
pub const ALLOWED_ADMIN_EMAILS: [&str; 2] = ["admin@voting.com", "luismarin@usa.com"];

/// Is this email on the admin allow-list?
pub fn email_is_allowed(email: &str) -> bool {
    ALLOWED_ADMIN_EMAILS.contains(&email)
}

/// Core admin user data.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCore {
    pub email: String,
    pub password_hash: String,
}

impl AdminCore {
    /// Create an admin record with a freshly hashed password.
    pub fn new(email: String, password: &str) -> Self {
        let salt: [u8; 16] = rand::random();
        let password_hash =
            argon2::hash_encoded(password.as_bytes(), &salt, &argon2::Config::default())
                .expect("argon2 hashing with the default config does not fail");
        Self {
            email,
            password_hash,
        }
    }

    /// Check whether the given password is correct.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> bool {
        // Unwrap safe because the only way to create an AdminCore is via
        // `AdminCore::new`, so the hash is always well-formed.
        argon2::verify_encoded(&self.password_hash, password.as_ref()).unwrap()
    }
}

/// An admin without an ID.
pub type NewAdmin = AdminCore;

/// An admin user from the database, with its unique ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct Admin {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub admin: AdminCore,
}

impl Deref for Admin {
    type Target = AdminCore;

    fn deref(&self) -> &Self::Target {
        &self.admin
    }
}

impl DerefMut for Admin {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.admin
    }
}

/// Ensure every allow-listed admin has a record, seeding missing ones with
/// the configured default password.
///
/// This operation is idempotent.
pub async fn ensure_admins_exist(
    admins: &Coll<NewAdmin>,
    default_password: &str,
) -> Result<(), mongodb::error::Error> {
    for email in ALLOWED_ADMIN_EMAILS {
        let filter = doc! { "email": email };
        if admins.find_one(filter, None).await?.is_none() {
            info!("Seeding admin account for {email}");
            let admin = NewAdmin::new(email.to_string(), default_password);
            admins.insert_one(admin, None).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_is_exact() {
        assert!(email_is_allowed("admin@voting.com"));
        assert!(email_is_allowed("luismarin@usa.com"));
        assert!(!email_is_allowed("someone@else.com"));
        assert!(!email_is_allowed("ADMIN@VOTING.COM"));
        assert!(!email_is_allowed(""));
    }

    #[test]
    fn password_verification_round_trips() {
        let admin = AdminCore::new("admin@voting.com".to_string(), "correct horse");
        assert!(admin.verify_password("correct horse"));
        assert!(!admin.verify_password("battery staple"));
        assert!(!admin.verify_password(""));
    }

    #[test]
    fn hashes_are_salted() {
        let first = AdminCore::new("admin@voting.com".to_string(), "hunter2");
        let second = AdminCore::new("admin@voting.com".to_string(), "hunter2");
        assert_ne!(first.password_hash, second.password_hash);
    }
}
