use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use uuid::Uuid;

/// Length of password-reset tokens.
pub const RESET_TOKEN_LEN: usize = 32;

/// Fresh user identifier (UUID v4, OS randomness).
pub fn new_identifier() -> Uuid {
    Uuid::new_v4()
}

/// Opaque alphanumeric token of `len` characters drawn from the OS CSPRNG.
pub fn new_token(len: usize) -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn token_has_requested_length_and_alphabet() {
        let token = new_token(48);
        assert_eq!(token.len(), 48);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(new_token(0).is_empty());
    }

    #[test]
    fn tokens_do_not_repeat() {
        let tokens: HashSet<String> = (0..1_000).map(|_| new_token(RESET_TOKEN_LEN)).collect();
        assert_eq!(tokens.len(), 1_000);
    }

    #[test]
    fn identifiers_are_v4() {
        let id = new_identifier();
        assert_eq!(id.get_version_num(), 4);
        assert_ne!(id, new_identifier());
    }
}
