use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatApiConfig {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub cat_api: CatApiConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "cats-api".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "cats-api-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24),
        };
        let cat_api = CatApiConfig {
            base_url: std::env::var("THECAT_API_BASE_URL")
                .unwrap_or_else(|_| "https://api.thecatapi.com/v1".into()),
            api_key: std::env::var("THECAT_API_KEY").unwrap_or_default(),
        };
        Ok(Self {
            database_url,
            jwt,
            cat_api,
        })
    }
}
