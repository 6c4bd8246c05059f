use twasync::client::Client;
use twasync::config::Config;
use twasync::status::StatusModel;

fn main() -> twasync::error::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let id = std::env::args()
        .nth(1)
        .and_then(|id| id.parse().ok())
        .unwrap_or(20);

    let client = Client::with_config(Config::from_env()?)?;

    // the request is in flight while we wait
    let mut status = client.show_status(id)?;

    let status = status.get()?;
    let author = status.user()?.map_or("?", |user| user.screen_name.as_str());

    println!("@{}: {}", author, status.text()?);
    println!("posted {} via {}", status.created_at()?, status.source()?);

    Ok(())
}
