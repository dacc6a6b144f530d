use argon2::Argon2;
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

pub const MIN_PASSWORD_LEN: usize = 8;
pub const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=32;

/// Hash a password with Argon2id and a random salt.
pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| format!("Failed to hash password: {e}"))
}

/// Verify a password against an Argon2id hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, String> {
    let parsed = PasswordHash::new(hash).map_err(|e| format!("Invalid password hash: {e}"))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Emails are matched case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Returns the name of the first offending field with a reason.
pub fn check_registration(
    username: &str,
    email: &str,
    password: &str,
) -> Result<(), (&'static str, String)> {
    let username_len = username.trim().chars().count();
    if !USERNAME_LEN.contains(&username_len) {
        return Err((
            "username",
            format!(
                "username must be between {} and {} characters",
                USERNAME_LEN.start(),
                USERNAME_LEN.end()
            ),
        ));
    }

    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
        _ => return Err(("email", "email must be a valid address".to_string())),
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err((
            "password",
            format!("password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }

    Ok(())
}
