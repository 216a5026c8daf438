use crate::auth::services::AuthService;
use crate::config::AppConfig;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let auth = Arc::new(AuthService::in_memory(&config.auth)?);
        Ok(Self { auth, config })
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            auth: crate::config::AuthConfig::default(),
        });
        let auth = Arc::new(crate::auth::services::test_service());
        Self { auth, config }
    }
}
