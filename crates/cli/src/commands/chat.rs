//! `huurwijzer chat` — Interactive or single-message chat mode.

use huurwijzer_assistant::ChatService;
use huurwijzer_config::AppConfig;

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if config.backend != "local" && config.backend != "ollama" && config.api_key.is_none() {
        eprintln!();
        eprintln!("  ERROR: No API key configured for backend '{}'.", config.backend);
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    HUURWIJZER_API_KEY=sk-...");
        eprintln!("    OPENAI_API_KEY=sk-...");
        eprintln!();
        eprintln!("  Or add api_key to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let generator = huurwijzer_providers::build_from_config(&config)?;
    let service = ChatService::from_config(&config, generator)?;

    if let Some(msg) = message {
        eprint!("  Thinking...");
        let reply = service.handle_message(&msg).await?;
        eprint!("\r             \r");
        println!("{reply}");
        return Ok(());
    }

    println!();
    println!("  huurwijzer — Dutch rental assistant");
    println!();
    println!("  Backend: {} ({})", config.backend, config.model);
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit, 'reset' to clear the conversation.");
    println!();

    let stdin = std::io::stdin();
    let mut line = String::new();

    loop {
        print!("  You > ");
        use std::io::Write;
        std::io::stdout().flush()?;

        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();

        match input {
            "" => continue,
            "exit" | "quit" => break,
            "reset" => {
                service.reset().await;
                println!("  (conversation cleared)");
                println!();
                continue;
            }
            _ => {}
        }

        eprint!("  ...");
        match service.handle_message(input).await {
            Ok(reply) => {
                eprint!("\r     \r");
                println!();
                for reply_line in reply.lines() {
                    println!("  Assistant > {reply_line}");
                }
                println!();
            }
            Err(e) => {
                eprint!("\r     \r");
                eprintln!("  [Error] {e}");
                println!();
            }
        }
    }

    println!();
    println!("  Tot ziens!");
    println!();

    Ok(())
}
