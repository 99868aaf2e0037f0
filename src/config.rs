use crate::model::role::Role;
use anyhow::{Context, Result, bail};
use dotenvy::dotenv;
use std::env;

/// Typed runtime configuration, read once at startup and validated before
/// the server binds. Every known key is enumerated here; there is no
/// free-form settings bag.
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    // Geofence
    pub office_latitude: f64,
    pub office_longitude: f64,
    pub geofence_radius_m: f64,

    // Live tracking
    pub tracking_required: bool,
    pub tracked_roles: Vec<Role>,

    // Activity log rolling window
    pub activity_retention_days: u32,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parsed_or<T: std::str::FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .with_context(|| format!("{key} is not a valid value"))
}

fn parse_roles(raw: &str) -> Result<Vec<Role>> {
    raw.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|name| {
            Role::from_name(name).with_context(|| format!("unknown role in TRACKED_ROLES: {name}"))
        })
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let config = Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: parsed_or("ACCESS_TOKEN_TTL", "900")?, // 15 min
            refresh_token_ttl: parsed_or("REFRESH_TOKEN_TTL", "604800")?, // 7 days

            rate_login_per_min: parsed_or("RATE_LOGIN_PER_MIN", "60")?,
            rate_register_per_min: parsed_or("RATE_REGISTER_PER_MIN", "30")?,
            rate_refresh_per_min: parsed_or("RATE_REFRESH_PER_MIN", "30")?,
            rate_protected_per_min: parsed_or("RATE_PROTECTED_PER_MIN", "1000")?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api/v1".to_string()),

            office_latitude: parsed_or("OFFICE_LATITUDE", "-6.251426")?,
            office_longitude: parsed_or("OFFICE_LONGITUDE", "107.113798")?,
            geofence_radius_m: parsed_or("GEOFENCE_RADIUS_M", "100")?,

            tracking_required: parsed_or("TRACKING_REQUIRED", "true")?,
            tracked_roles: parse_roles(
                &env::var("TRACKED_ROLES").unwrap_or_else(|_| "staff".to_string()),
            )?,

            activity_retention_days: parsed_or("ACTIVITY_RETENTION_DAYS", "3")?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.office_latitude) {
            bail!("OFFICE_LATITUDE out of range: {}", self.office_latitude);
        }
        if !(-180.0..=180.0).contains(&self.office_longitude) {
            bail!("OFFICE_LONGITUDE out of range: {}", self.office_longitude);
        }
        if !self.geofence_radius_m.is_finite() || self.geofence_radius_m <= 0.0 {
            bail!("GEOFENCE_RADIUS_M must be a positive number");
        }
        if self.activity_retention_days == 0 {
            bail!("ACTIVITY_RETENTION_DAYS must be at least 1");
        }
        Ok(())
    }

    pub fn is_tracked_role(&self, role: Role) -> bool {
        self.tracked_roles.contains(&role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config {
            database_url: "mysql://".into(),
            jwt_secret: "secret".into(),
            server_addr: "127.0.0.1:8080".into(),
            access_token_ttl: 900,
            refresh_token_ttl: 604800,
            rate_login_per_min: 60,
            rate_register_per_min: 30,
            rate_refresh_per_min: 30,
            rate_protected_per_min: 1000,
            api_prefix: "/api/v1".into(),
            office_latitude: -6.251426,
            office_longitude: 107.113798,
            geofence_radius_m: 100.0,
            tracking_required: true,
            tracked_roles: vec![Role::Staff],
            activity_retention_days: 3,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let mut c = base();
        c.office_latitude = 91.0;
        assert!(c.validate().is_err());

        let mut c = base();
        c.office_longitude = -200.0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn rejects_bad_radius() {
        let mut c = base();
        c.geofence_radius_m = 0.0;
        assert!(c.validate().is_err());
        c.geofence_radius_m = f64::NAN;
        assert!(c.validate().is_err());
    }

    #[test]
    fn parses_tracked_roles() {
        let roles = parse_roles("staff, supervisor").unwrap();
        assert_eq!(roles, vec![Role::Staff, Role::Supervisor]);
        assert!(parse_roles("staff,wizard").is_err());
    }
}
