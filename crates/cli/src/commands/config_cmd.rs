//! `roundtable config` — Configuration management commands.

use roundtable_config::AppConfig;

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let mut warnings = Vec::new();

            if config.worker.lookback == 0 {
                warnings.push("worker.lookback = 0: only the latest message is ever scanned");
            }

            if config.preprocess.endpoint.starts_with("http://")
                && !is_loopback(&config.preprocess.endpoint)
            {
                warnings.push("Documents are uploaded over plain HTTP to a remote host");
            }

            if config.session.max_turns.is_none() {
                warnings.push("No session.max_turns: sessions run until you exit");
            }

            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Endpoint:  {}", config.preprocess.endpoint);
            println!("   Field:     {}", config.preprocess.upload_field);
            println!("   Output:    {}", config.preprocess.output_path.display());
            println!("   Timeout:   {}s", config.preprocess.timeout_secs);
            println!("   Lookback:  {}", config.worker.lookback);
            println!("   Confirm:   {}", config.worker.confirm_uploads);
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}

pub async fn init(force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let dir = AppConfig::config_dir();
    let config_path = dir.join("config.toml");

    if config_path.exists() && !force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        )
        .into());
    }

    std::fs::create_dir_all(&dir)?;
    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("✅ Wrote {}", config_path.display());
    Ok(())
}

fn is_loopback(endpoint: &str) -> bool {
    let host = endpoint
        .split("://")
        .nth(1)
        .and_then(|rest| rest.split(['/', ':']).next())
        .unwrap_or_default();
    matches!(host, "localhost" | "127.0.0.1")
}
