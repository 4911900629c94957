use std::fmt;

const MAX_HANDLE_LENGTH: usize = 64;

#[derive(Debug, PartialEq, Eq)]
pub enum IdentityError {
    Empty,
    TooLong(usize),
    InvalidCharacter(char),
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityError::Empty => write!(f, "Account name is required"),
            IdentityError::TooLong(len) => {
                write!(f, "Account name is too long ({} > {})", len, MAX_HANDLE_LENGTH)
            }
            IdentityError::InvalidCharacter(c) => {
                write!(f, "Account name contains an invalid character: '{}'", c)
            }
        }
    }
}

impl std::error::Error for IdentityError {}

/// A signed-in user. The id namespaces everything persisted for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    user_id: String,
}

impl Identity {
    /// Signs in with an account handle (e-mail or user name).
    pub fn sign_in(handle: &str) -> Result<Self, IdentityError> {
        let user_id = handle.trim().to_lowercase();
        if user_id.is_empty() {
            return Err(IdentityError::Empty);
        }
        let len = user_id.chars().count();
        if len > MAX_HANDLE_LENGTH {
            return Err(IdentityError::TooLong(len));
        }
        if let Some(c) = user_id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || "._@+-".contains(*c)))
        {
            return Err(IdentityError::InvalidCharacter(c));
        }
        Ok(Self { user_id })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_is_normalized() {
        let identity = Identity::sign_in("  Kenji.Sato@Example.com ").unwrap();
        assert_eq!(identity.user_id(), "kenji.sato@example.com");
        assert_eq!(identity, Identity::sign_in("kenji.sato@example.com").unwrap());
    }

    #[test]
    fn rejects_bad_handles() {
        assert_eq!(Identity::sign_in("   "), Err(IdentityError::Empty));
        assert_eq!(
            Identity::sign_in("a/b"),
            Err(IdentityError::InvalidCharacter('/'))
        );
        assert_eq!(
            Identity::sign_in(&"a".repeat(65)),
            Err(IdentityError::TooLong(65))
        );
    }
}
