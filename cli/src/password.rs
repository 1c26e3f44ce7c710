//! Password prompts for the encrypted session store

use anyhow::{bail, Context, Result};

/// Password strength validation
pub fn validate_password_strength(password: &str) -> Result<()> {
    if password.len() < 8 {
        bail!("Password must be at least 8 characters");
    }

    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_digit = password.chars().any(|c| c.is_numeric());

    if !has_upper || !has_lower || !has_digit {
        bail!("Password must contain uppercase, lowercase, and numeric characters");
    }

    Ok(())
}

/// Prompt for password securely (hides input). The `ZKLOGIN_PASSWORD`
/// environment variable bypasses the prompt for non-interactive use.
pub fn prompt_password(prompt: &str) -> Result<String> {
    if let Ok(password) = std::env::var("ZKLOGIN_PASSWORD") {
        return Ok(password);
    }
    rpassword::prompt_password(prompt).context("Failed to read password")
}

/// Prompt for a new password with confirmation
pub fn prompt_new_password(prompt: &str) -> Result<String> {
    if let Ok(password) = std::env::var("ZKLOGIN_PASSWORD") {
        validate_password_strength(&password)?;
        return Ok(password);
    }

    let password = rpassword::prompt_password(prompt).context("Failed to read password")?;
    let confirm = rpassword::prompt_password("Confirm password: ")?;

    if password != confirm {
        bail!("Passwords do not match");
    }

    validate_password_strength(&password)?;

    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_validation() {
        assert!(validate_password_strength("short").is_err());
        assert!(validate_password_strength("alllowercase").is_err());
        assert!(validate_password_strength("ALLUPPERCASE").is_err());
        assert!(validate_password_strength("NoNumbers").is_err());
        assert!(validate_password_strength("ValidPass123").is_ok());
    }
}
