//! `huurwijzer prompt` — Print the rendered system prompt.
//!
//! Useful for checking what the configured domain data actually renders to
//! before pointing a backend at it.

use huurwijzer_assistant::render_system_prompt;
use huurwijzer_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let prompt = render_system_prompt(&config.domain)?;
    println!("{prompt}");
    Ok(())
}
