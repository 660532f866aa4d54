use anyhow::Context;
use keydash::bootstrap;
use keydash::config::Config;
use keydash::infrastructure::observability;
use keydash::infrastructure::terminal::{self, Flow};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init_tracing().map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    let dashboard = bootstrap::build_dashboard(&config).context("Failed to build dashboard")?;

    // Re-render whenever the snapshot changes
    let mut revisions = WatchStream::new(dashboard.subscribe());
    let renderer = {
        let dashboard = dashboard.clone();
        tokio::spawn(async move {
            while revisions.next().await.is_some() {
                // Coalesce bursts of revisions into one frame
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                println!("{}", terminal::render(&dashboard.snapshot()));
            }
        })
    };

    dashboard.mount();
    println!("{}", terminal::commands::HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                match terminal::parse_command(&line) {
                    Ok(Some(command)) => {
                        if terminal::execute(&dashboard, command).await == Flow::Quit {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => eprintln!("{}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    dashboard.shutdown();
    renderer.abort();
    tracing::info!("Bye");
    Ok(())
}
