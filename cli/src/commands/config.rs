use anyhow::Result;
use llamaup_core::Config;

pub async fn execute(mut config: Config, key: Option<&str>, value: Option<&str>) -> Result<()> {
    match (key, value) {
        // Show all config
        (None, _) => {
            println!("Configuration file: {}\n", Config::config_path()?.display());
            println!("[hub]");
            println!("  endpoint = \"{}\"", config.hub.endpoint);
            println!("  timeout_secs = {}", config.hub.timeout_secs);
            println!("  user_agent = \"{}\"", config.hub.user_agent);
            println!();
            println!("[models]");
            println!(
                "  install_root = {}",
                config
                    .models
                    .install_root
                    .as_ref()
                    .map(|p| format!("{:?}", p.display().to_string()))
                    .unwrap_or_else(|| "(default)".to_string())
            );
            println!("  search_limit = {}", config.models.search_limit);
        }

        (Some(key), None) => {
            println!("{}", get_config_value(&config, key)?);
        }

        (Some(key), Some(value)) => {
            set_config_value(&mut config, key, value)?;
            config.save()?;
            println!("Set {} = {}", key, value);
        }
    }

    Ok(())
}

fn get_config_value(config: &Config, key: &str) -> Result<String> {
    match key {
        "hub.endpoint" => Ok(config.hub.endpoint.clone()),
        "hub.timeout_secs" => Ok(config.hub.timeout_secs.to_string()),
        "hub.user_agent" => Ok(config.hub.user_agent.clone()),
        "models.install_root" => Ok(config
            .models
            .install_root
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()),
        "models.search_limit" => Ok(config.models.search_limit.to_string()),
        _ => anyhow::bail!("Unknown config key: {}", key),
    }
}

fn set_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "hub.endpoint" => config.hub.endpoint = value.trim_end_matches('/').to_string(),
        "hub.timeout_secs" => config.hub.timeout_secs = value.parse()?,
        "hub.user_agent" => config.hub.user_agent = value.to_string(),
        "models.install_root" => {
            config.models.install_root = if value.is_empty() {
                None
            } else {
                Some(value.into())
            }
        }
        "models.search_limit" => {
            let limit: usize = value.parse()?;
            if limit == 0 {
                anyhow::bail!("models.search_limit must be at least 1");
            }
            config.models.search_limit = limit;
        }
        _ => anyhow::bail!("Unknown config key: {}", key),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_set_and_get() {
        let mut config = Config::default();

        set_config_value(&mut config, "hub.endpoint", "http://mirror.local/").unwrap();
        set_config_value(&mut config, "models.search_limit", "7").unwrap();
        set_config_value(&mut config, "models.install_root", "/srv/llama").unwrap();

        assert_eq!(get_config_value(&config, "hub.endpoint").unwrap(), "http://mirror.local");
        assert_eq!(config.models.search_limit, 7);
        assert_eq!(config.models.install_root, Some(PathBuf::from("/srv/llama")));

        set_config_value(&mut config, "models.install_root", "").unwrap();
        assert!(config.models.install_root.is_none());
    }

    #[test]
    fn test_rejects_bad_input() {
        let mut config = Config::default();
        assert!(set_config_value(&mut config, "hub.timeout_secs", "soon").is_err());
        assert!(set_config_value(&mut config, "models.search_limit", "0").is_err());
        assert!(set_config_value(&mut config, "daemon.port", "1").is_err());
        assert!(get_config_value(&config, "nope").is_err());
    }
}
