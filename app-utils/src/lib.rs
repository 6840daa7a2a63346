use std::env;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{debug, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, registry, EnvFilter};
use webuntis_api::class::Class;
use webuntis_api::class_selector::ClassSelector;
use webuntis_api::client::{client, Client};
use webuntis_api::creds::Creds;
use webuntis_api::services::untis_service::UntisService;
use webuntis_api::types::{DateRange, Institution};

pub const DEFAULT_SERVER: &str = "borys.webuntis.com";
pub const DEFAULT_SCHOOL: &str = "Carl-v.-Ossietzky-GYM";
pub const DEFAULT_START: &str = "2025-02-10";
pub const DEFAULT_END: &str = "2025-07-23";

/// Everything needed to produce a report, apart from credentials.
#[derive(Debug, Clone)]
pub struct Settings {
    pub institution: Institution,
    pub window: DateRange,
    pub class: Option<ClassSelector>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Reads settings through `var`, falling back to the defaults for the current term.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let server = var("WEBUNTIS_SERVER").unwrap_or_else(|| DEFAULT_SERVER.to_owned());
        let school = var("WEBUNTIS_SCHOOL").unwrap_or_else(|| DEFAULT_SCHOOL.to_owned());

        let start = parse_date("REPORT_START", var("REPORT_START"), DEFAULT_START)?;
        let end = parse_date("REPORT_END", var("REPORT_END"), DEFAULT_END)?;
        let window = DateRange::new(start, end)?;

        let class = var("CLASS")
            .filter(|selector| !selector.is_empty())
            .map(ClassSelector::new);

        Ok(Self {
            institution: Institution::new(server, school),
            window,
            class,
        })
    }

    /// Replaces either end of the reporting window. The result must still be a valid window.
    pub fn with_window(
        mut self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Self> {
        if start.is_some() || end.is_some() {
            let start = start.unwrap_or(self.window.start());
            let end = end.unwrap_or(self.window.end());
            self.window = DateRange::new(start, end)?;
        }
        Ok(self)
    }
}

/// Command line values that take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub user: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// The password always comes from `WEBUNTIS_PASSWORD`; `user` wins over `WEBUNTIS_USER`.
pub fn creds_from_vars(
    user: Option<String>,
    var: impl Fn(&str) -> Option<String>,
) -> Result<Creds> {
    let user = user
        .or_else(|| var("WEBUNTIS_USER"))
        .context("`WEBUNTIS_USER` must be set or a user given on the command line")?;
    let password = var("WEBUNTIS_PASSWORD").context("`WEBUNTIS_PASSWORD` must be set")?;
    Ok(Creds::new(user, password))
}

fn parse_date(key: &str, value: Option<String>, default: &str) -> Result<NaiveDate> {
    let value = value.unwrap_or_else(|| default.to_owned());
    value
        .parse()
        .with_context(|| format!("`{key}` must be a date like 2025-02-10, got `{value}`"))
}

/// Expects `.env` to be loaded already. Everything is validated before logging in.
pub async fn init_from_env(overrides: Overrides) -> Result<InitFromEnv<impl UntisService>> {
    let settings = Settings::from_env()?.with_window(overrides.start, overrides.end)?;
    debug!(?settings, "loaded settings");

    let creds = creds_from_vars(overrides.user, |key| env::var(key).ok())?;

    let untis = client(settings.institution.clone(), creds).await?;
    let classes = list_classes(&untis).await?;
    info!(count = classes.len(), "initialized");

    Ok(InitFromEnv {
        settings,
        untis,
        classes,
    })
}

/// Lists the classes, closing the session if that fails.
async fn list_classes<Service: UntisService>(untis: &Client<Service>) -> Result<Vec<Class>> {
    match untis.get_classes().await {
        Ok(classes) => Ok(classes),
        Err(err) => {
            if let Err(logout_err) = untis.logout().await {
                warn!(%logout_err, "could not log out of WebUntis");
            }
            Err(err)
        }
    }
}

pub struct InitFromEnv<Service> {
    pub settings: Settings,
    pub untis: Client<Service>,
    pub classes: Vec<Class>,
}

pub fn init_tracing() -> Result<()> {
    registry()
        .with(fmt::layer().event_format(format().pretty()))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env()?,
        )
        .init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use serde_json::{json, Value};
    use tower::service_fn;
    use webuntis_api::services::untis_service::RpcRequest;

    use super::*;

    fn vars(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings> {
        Settings::from_vars(vars(pairs))
    }

    #[test]
    fn defaults_to_the_current_term() {
        let settings = settings(&[]).unwrap();
        assert_eq!(settings.institution.server(), DEFAULT_SERVER);
        assert_eq!(settings.institution.school(), DEFAULT_SCHOOL);
        assert_eq!(
            settings.window.start(),
            NaiveDate::from_ymd_opt(2025, 2, 10).unwrap()
        );
        assert_eq!(
            settings.window.end(),
            NaiveDate::from_ymd_opt(2025, 7, 23).unwrap()
        );
        assert!(settings.class.is_none());
    }

    #[test]
    fn environment_overrides_defaults() {
        let settings = settings(&[
            ("WEBUNTIS_SERVER", "mese.webuntis.com"),
            ("REPORT_START", "2025-09-01"),
            ("REPORT_END", "2026-01-31"),
            ("CLASS", "7b"),
        ])
        .unwrap();
        assert_eq!(settings.institution.server(), "mese.webuntis.com");
        assert_eq!(settings.window.to_string(), "2025-09-01 – 2026-01-31");
        assert_eq!(settings.class.unwrap().as_str(), "7b");
    }

    #[test]
    fn rejects_bad_windows() {
        let err = settings(&[("REPORT_START", "10.02.2025")]).unwrap_err();
        assert!(err.to_string().contains("REPORT_START"));

        assert!(settings(&[("REPORT_START", "2025-08-01")]).is_err());
    }

    #[test]
    fn window_override_replaces_either_end() {
        let settings = settings(&[]).unwrap();

        let unchanged = settings.clone().with_window(None, None).unwrap();
        assert_eq!(unchanged.window, settings.window);

        let moved = settings
            .clone()
            .with_window(Some(date(2025, 3, 1)), None)
            .unwrap();
        assert_eq!(moved.window.start(), date(2025, 3, 1));
        assert_eq!(moved.window.end(), date(2025, 7, 23));
    }

    #[test]
    fn window_override_must_stay_ordered() {
        let settings = settings(&[]).unwrap();
        assert!(settings.with_window(None, Some(date(2025, 1, 1))).is_err());
    }

    #[test]
    fn user_flag_does_not_need_user_variable() {
        let env = vars(&[("WEBUNTIS_PASSWORD", "pw")]);
        let creds = creds_from_vars(Some("lehrer".to_owned()), env).unwrap();
        assert_eq!(creds.user(), "lehrer");
    }

    #[test]
    fn user_flag_wins_over_user_variable() {
        let env = vars(&[("WEBUNTIS_USER", "sekretariat"), ("WEBUNTIS_PASSWORD", "pw")]);
        assert_eq!(creds_from_vars(Some("lehrer".to_owned()), &env).unwrap().user(), "lehrer");
        assert_eq!(creds_from_vars(None, &env).unwrap().user(), "sekretariat");
    }

    #[test]
    fn credentials_need_user_and_password() {
        let err = creds_from_vars(None, vars(&[("WEBUNTIS_PASSWORD", "pw")])).unwrap_err();
        assert!(err.to_string().contains("WEBUNTIS_USER"));

        let err = creds_from_vars(Some("lehrer".to_owned()), vars(&[])).unwrap_err();
        assert!(err.to_string().contains("WEBUNTIS_PASSWORD"));
    }

    #[tokio::test]
    async fn failed_class_listing_logs_out() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let log = calls.clone();
        let untis = Client::new(service_fn(move |request: RpcRequest| {
            log.lock().unwrap().push(request.method().to_owned());
            async move {
                match request.method() {
                    "logout" => Ok(Value::Null),
                    _ => Err(anyhow::anyhow!("no rights to list classes")),
                }
            }
        }));

        let err = list_classes(&untis).await.unwrap_err();

        assert_eq!(err.to_string(), "WebUntis request `getKlassen` failed");
        assert_eq!(*calls.lock().unwrap(), ["getKlassen", "logout"]);
    }

    #[tokio::test]
    async fn listed_classes_keep_the_session() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let log = calls.clone();
        let untis = Client::new(service_fn(move |request: RpcRequest| {
            log.lock().unwrap().push(request.method().to_owned());
            async { Ok::<_, anyhow::Error>(json!([{ "id": 12, "name": "5a" }])) }
        }));

        let classes = list_classes(&untis).await.unwrap();

        assert_eq!(classes[0].label(), "5a (12)");
        assert_eq!(*calls.lock().unwrap(), ["getKlassen"]);
    }
}
