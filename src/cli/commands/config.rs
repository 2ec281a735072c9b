use crate::config::Settings;
use crate::Result;

pub fn show() -> Result<()> {
    println!("Configuration:");
    println!();

    println!("Config file:");
    match Settings::config_path() {
        Some(path) if path.exists() => println!("  {}", path.display()),
        Some(path) => println!("  {} (not present, using defaults)", path.display()),
        None => println!("  (cannot determine config directory)"),
    }

    let settings = Settings::load()?;
    println!();
    println!("Settings:");
    println!("  ssh_user: {}", settings.ssh_user);
    println!("  image: {}", settings.image);
    println!("  pod_lifetime_secs: {}", settings.pod_lifetime_secs);
    println!("  poll_attempts: {}", settings.poll_attempts);
    println!("  poll_interval_secs: {}", settings.poll_interval_secs);

    Ok(())
}
