use serde::Deserialize;

/// Cost parameters for the argon2id password hasher.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct HashConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub reset_ttl_hours: i64,
    pub session_token_len: usize,
    pub hash: HashConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            reset_ttl_hours: 24,
            session_token_len: 32,
            hash: HashConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub auth: AuthConfig,
}

/// Session tokens shorter than this are not accepted from configuration.
const MIN_SESSION_TOKEN_LEN: usize = 16;

/// Reset windows longer than a year are refused.
const MAX_RESET_TTL_HOURS: i64 = 24 * 365;

pub fn check_reset_ttl_hours(hours: i64) -> anyhow::Result<i64> {
    if !(1..=MAX_RESET_TTL_HOURS).contains(&hours) {
        anyhow::bail!("RESET_TOKEN_TTL_HOURS must be between 1 and {MAX_RESET_TTL_HOURS}, got {hours}");
    }
    Ok(hours)
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = AuthConfig::default();
        let hash = HashConfig {
            memory_kib: env_or("ARGON2_MEMORY_KIB", defaults.hash.memory_kib),
            iterations: env_or("ARGON2_ITERATIONS", defaults.hash.iterations),
            parallelism: env_or("ARGON2_PARALLELISM", defaults.hash.parallelism),
        };
        let auth = AuthConfig {
            reset_ttl_hours: check_reset_ttl_hours(env_or(
                "RESET_TOKEN_TTL_HOURS",
                defaults.reset_ttl_hours,
            ))?,
            session_token_len: env_or("SESSION_TOKEN_LENGTH", defaults.session_token_len)
                .max(MIN_SESSION_TOKEN_LEN),
            hash,
        };
        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("APP_PORT", 8080),
            auth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_a_day_long_reset_window() {
        let cfg = AuthConfig::default();
        assert_eq!(cfg.reset_ttl_hours, 24);
        assert_eq!(cfg.session_token_len, 32);
        assert_eq!(cfg.hash.memory_kib, argon2::Params::DEFAULT_M_COST);
    }

    #[test]
    fn reset_window_must_stay_in_range() {
        assert_eq!(check_reset_ttl_hours(24).unwrap(), 24);
        assert_eq!(check_reset_ttl_hours(1).unwrap(), 1);
        assert_eq!(check_reset_ttl_hours(MAX_RESET_TTL_HOURS).unwrap(), MAX_RESET_TTL_HOURS);
        for bad in [0, -5, MAX_RESET_TTL_HOURS + 1, 1_000_000_000, i64::MAX] {
            let err = check_reset_ttl_hours(bad).unwrap_err();
            assert!(err.to_string().contains("RESET_TOKEN_TTL_HOURS"));
        }
    }

    #[test]
    fn env_or_falls_back_on_garbage() {
        std::env::set_var("AUTHSVC_TEST_GARBAGE_NUMBER", "not-a-number");
        assert_eq!(env_or("AUTHSVC_TEST_GARBAGE_NUMBER", 7u32), 7);
        std::env::set_var("AUTHSVC_TEST_GOOD_NUMBER", "42");
        assert_eq!(env_or("AUTHSVC_TEST_GOOD_NUMBER", 7u32), 42);
    }
}
