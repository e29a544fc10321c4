use std::env;

/// Origins allowed to make credentialed requests.
///
/// Public read-only endpoints are not governed by this list; they answer
/// any origin.
#[derive(Clone, Debug)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self::parse("http://localhost:3000,http://localhost:5173")
    }
}

impl CorsConfig {
    pub fn from_env() -> Self {
        env::var("ALLOWED_ORIGINS")
            .map(|v| Self::parse(&v))
            .unwrap_or_default()
    }

    pub fn parse(list: &str) -> Self {
        let allowed_origins = list
            .split(',')
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self { allowed_origins }
    }
}
