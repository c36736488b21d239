use raina_stream::{EventRouter, NotificationStream, StreamOptions};
use tokio::sync::mpsc;

/// Tails the notification stream, printing log lines and routed step events
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing to see connection logs
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "raina_stream=info".into()),
        )
        .init();

    let mut options = StreamOptions::from_env()?;
    if let Some(url) = std::env::args().nth(1) {
        options = options.with_url(url);
    }
    println!("Tailing notifications from {}", options.url);

    let (forward_tx, mut forward_rx) = mpsc::unbounded_channel();
    let stream = NotificationStream::builder(options)
        .log_sink(|line: &str| println!("{}", line))
        .shared_on_event(EventRouter::new().into_channel(forward_tx))
        .build()?;

    loop {
        tokio::select! {
            Some(message) = forward_rx.recv() => {
                if message.kind == raina_stream::ForwardKind::Step {
                    println!("  step -> {}", message.payload);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    println!("Shutting down");
    stream.dispose();
    stream.closed().await;
    Ok(())
}
