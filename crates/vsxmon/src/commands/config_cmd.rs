//! Config subcommand handlers.

use std::io::BufRead;

use tabled::Tabled;
use vsxmon_config::{Config, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

const MASK: &str = "****";

#[derive(Clone, Tabled, serde::Serialize)]
struct ProfileRow {
    #[tabled(rename = "Profile")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Default")]
    default: String,
}

/// Mask plaintext passwords before display.
fn redact(mut cfg: Config) -> Config {
    for profile in cfg.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some(MASK.into());
        }
    }
    cfg
}

fn save(cfg: &Config, global: &GlobalOpts) -> Result<std::path::PathBuf, CliError> {
    let path = config::config_path(global);
    vsxmon_config::save_config(cfg, &path)?;
    Ok(path)
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path(global).display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = redact(config::load_config(global)?);
            let rendered = match global.output {
                OutputFormat::Table | OutputFormat::Plain => toml::to_string_pretty(&cfg)
                    .map_err(|e| CliError::Internal {
                        message: format!("failed to render config: {e}"),
                    })?,
                format => output::render_single(format, &cfg, |_| String::new(), |_| String::new()),
            };
            output::print_output(&rendered, global.quiet);
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config(global)?;
            let rows: Vec<ProfileRow> = cfg
                .profiles
                .iter()
                .map(|(name, p)| ProfileRow {
                    name: name.clone(),
                    address: format!("{}://{}:{}", p.proto, p.host, p.port),
                    default: if cfg.default_profile.as_deref() == Some(name.as_str()) {
                        "*".into()
                    } else {
                        String::new()
                    },
                })
                .collect();
            let rendered =
                output::render_list(global.output, &rows, ProfileRow::clone, |r| r.name.clone());
            output::print_output(&rendered, global.quiet);
            Ok(())
        }

        ConfigCommand::Init {
            host,
            username,
            name,
            password_env,
            force,
        } => {
            let mut cfg = config::load_config(global)?;
            let name = name
                .or_else(|| global.profile.clone())
                .unwrap_or_else(|| "default".into());

            if cfg.profiles.contains_key(&name) && !force {
                return Err(CliError::Validation {
                    field: "name".into(),
                    reason: format!("profile '{name}' already exists (use --force to replace it)"),
                });
            }

            let mut profile = Profile::new(host);
            profile.username = Some(username);
            profile.password_env = password_env;
            if let Some(port) = global.port {
                profile.port = port;
            }
            if let Some(proto) = &global.proto {
                profile.proto.clone_from(proto);
            }
            profile.url()?;

            let first = cfg.profiles.is_empty();
            cfg.profiles.insert(name.clone(), profile);
            if first || cfg.default_profile.is_none() {
                cfg.default_profile = Some(name.clone());
            }

            let path = save(&cfg, global)?;
            output::print_output(
                &format!(
                    "Profile '{name}' written to {}\n\
                     Store its password with: vsxmon config set-password --name {name}",
                    path.display()
                ),
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config(global)?;
            cfg.profile(&name)?;
            cfg.default_profile = Some(name.clone());
            save(&cfg, global)?;
            output::print_output(&format!("Default profile set to '{name}'"), global.quiet);
            Ok(())
        }

        ConfigCommand::SetPassword { name } => {
            let cfg = config::load_config(global)?;
            let name = name.unwrap_or_else(|| config::active_profile_name(global, &cfg));

            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            let password = line.trim_end_matches(['\r', '\n']);
            if password.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "expected the password on standard input".into(),
                });
            }

            vsxmon_config::store_password(&name, password)?;
            output::print_output(
                &format!("Password for profile '{name}' stored in the system keyring"),
                global.quiet,
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plaintext_passwords_are_masked() {
        let mut cfg = Config::default();
        let mut profile = Profile::new("10.0.0.5");
        profile.password = Some("s3cret".into());
        cfg.profiles.insert("edge".into(), profile);
        cfg.profiles.insert("lab".into(), Profile::new("10.0.0.6"));

        let cfg = redact(cfg);
        assert_eq!(cfg.profiles["edge"].password.as_deref(), Some(MASK));
        assert_eq!(cfg.profiles["lab"].password, None);
    }
}
