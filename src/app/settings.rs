use std::{ffi::OsString, path::PathBuf};

use anyhow::Context;
use log::warn;

use crate::{app::params::ParamStore, cli::Cli, data::measurements::Credentials};

/// Process-wide service configuration, resolved once from the command line
/// and its environment fallbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    pub api_url: Option<String>,
    pub credentials: Option<Credentials>,
    pub config_dir: PathBuf,
}

impl ServiceSettings {
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let config_dir = resolve_config_dir(cli.config_dir.clone(), std::env::var_os("HOME"))
            .context("no config directory: pass --config-dir or set HOME")?;
        let credentials = match (&cli.login, &cli.password) {
            (Some(login), Some(password)) => Some(Credentials {
                login: login.clone(),
                password: password.clone(),
            }),
            _ => None,
        };
        Ok(Self {
            api_url: cli.api_url.clone(),
            credentials,
            config_dir,
        })
    }
}

pub fn resolve_config_dir(explicit: Option<PathBuf>, home: Option<OsString>) -> Option<PathBuf> {
    if let Some(dir) = explicit {
        return Some(dir);
    }
    let home = home?;
    Some(PathBuf::from(home).join(".config").join("airsense"))
}

/// Starting parameter set. An explicit type list deactivates every type it
/// does not name; unknown names are ignored.
pub fn initial_params(cli: &Cli) -> ParamStore {
    let mut params = ParamStore::default().with_horizon(i64::from(cli.horizon));

    if !cli.types.is_empty() {
        let wanted: Vec<&str> = cli.types.iter().map(|id| id.trim()).collect();
        for id in wanted.iter().filter(|id| !params.is_known(id)) {
            warn!("ignoring unknown measurement type {id:?}");
        }
        let known: Vec<String> = params.types().iter().map(|kind| kind.id.clone()).collect();
        for id in known {
            let active = wanted.contains(&id.as_str());
            params = params.with_active(&id, active);
        }
    }

    if let Some(color) = &cli.color {
        params = params.with_display_color(color.clone());
    }
    params
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::app::params::{DEFAULT_HORIZON_DAYS, DEFAULT_TYPES, DISPLAY_PALETTE};

    #[test]
    fn explicit_config_dir_wins_over_home() {
        let dir = resolve_config_dir(
            Some(PathBuf::from("/tmp/airsense")),
            Some(OsString::from("/home/ada")),
        );
        assert_eq!(dir, Some(PathBuf::from("/tmp/airsense")));
    }

    #[test]
    fn config_dir_defaults_under_home() {
        let dir = resolve_config_dir(None, Some(OsString::from("/home/ada")));
        assert_eq!(dir, Some(PathBuf::from("/home/ada/.config/airsense")));
        assert_eq!(resolve_config_dir(None, None), None);
    }

    #[test]
    fn defaults_activate_every_type() {
        let cli = Cli::parse_from(["airsense", "locations"]);
        let params = initial_params(&cli);
        assert_eq!(params.active_ids(), DEFAULT_TYPES.to_vec());
        assert_eq!(
            i64::from(params.horizon().days()),
            DEFAULT_HORIZON_DAYS
        );
        assert_eq!(params.display_color(), DISPLAY_PALETTE[0]);
    }

    #[test]
    fn type_list_narrows_active_set_in_declaration_order() {
        let cli = Cli::parse_from([
            "airsense",
            "--types",
            "stink, temperature,radon",
            "--horizon",
            "5",
            "--color",
            "teal",
            "locations",
        ]);
        let params = initial_params(&cli);
        assert_eq!(params.active_ids(), vec!["temperature", "stink"]);
        assert_eq!(params.horizon().days(), 5);
        assert_eq!(params.display_color(), "teal");
    }

    #[test]
    fn credentials_need_both_halves() {
        let cli = Cli::parse_from([
            "airsense",
            "--config-dir",
            "/tmp/airsense",
            "--login",
            "user",
            "--password",
            "secret",
            "locations",
        ]);
        let settings = ServiceSettings::from_cli(&cli).expect("settings");
        assert_eq!(
            settings.credentials,
            Some(Credentials {
                login: "user".to_string(),
                password: "secret".to_string(),
            })
        );
        assert_eq!(settings.config_dir, PathBuf::from("/tmp/airsense"));
    }
}
