use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,

    pub jwt_secret: String,
    pub jwt_access_ttl_secs: i64,

    pub default_matching_radius_m: f64,

    pub classifier_api_url: String,
    pub classifier_api_key: String,
    pub classifier_model: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .expect("PORT must be a number"),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),

            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            jwt_access_ttl_secs: env::var("JWT_ACCESS_TTL_SECS")
                .unwrap_or_else(|_| "86400".into())
                .parse()
                .expect("JWT_ACCESS_TTL_SECS must be a number"),

            default_matching_radius_m: env::var("DEFAULT_MATCHING_RADIUS_M")
                .unwrap_or_else(|_| "1500".into())
                .parse()
                .expect("DEFAULT_MATCHING_RADIUS_M must be a number"),

            classifier_api_url: env::var("CLASSIFIER_API_URL")
                .unwrap_or_else(|_| "https://api.anthropic.com/v1/messages".into()),
            classifier_api_key: env::var("CLASSIFIER_API_KEY").unwrap_or_else(|_| String::new()),
            classifier_model: env::var("CLASSIFIER_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4-20250514".into()),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
