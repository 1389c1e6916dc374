use anyhow::{Context, Result};
use bandwissel_advice::{build_service, render_html, render_text};
use bandwissel_core::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Text,
    Html,
    Json,
}

fn parse_output(args: impl Iterator<Item = String>) -> Result<Output> {
    let mut output = Output::Text;
    for arg in args {
        output = match arg.as_str() {
            "--html" => Output::Html,
            "--json" => Output::Json,
            "--text" => Output::Text,
            other => anyhow::bail!("Unknown argument: {} (use --text, --html or --json)", other),
        };
    }
    Ok(output)
}

#[tokio::main]
async fn main() -> Result<()> {
    bandwissel_core::init()?;

    let output = parse_output(std::env::args().skip(1))?;

    // Warnings are logged while loading; errors reject the file
    let (config, _) = match Config::load_validated() {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("{}", e.user_message());
            return Err(e).context("Failed to load configuration");
        }
    };

    let service = build_service(&config).context("Failed to set up advice service")?;
    let today = chrono::Local::now().date_naive();

    tracing::info!("Bandwissel requesting advice for {}", today);

    match service.request_advice(today).await {
        Ok(report) => {
            match output {
                Output::Text => print!("{}", render_text(&report)),
                Output::Html => print!("{}", render_html(&report)),
                Output::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", e.user_message());
            Err(e.into())
        }
    }
}
