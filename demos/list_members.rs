use futures::prelude::*;
use twasync::client::Client;
use twasync::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut args = std::env::args().skip(1);
    let owner = args.next().unwrap_or_else(|| String::from("twitter"));
    let list_id = args.next().and_then(|id| id.parse().ok()).unwrap_or(8044403);

    let mut client = Client::with_config(Config::from_env()?)?;

    if let Ok(token) = std::env::var("TWASYNC_BEARER_TOKEN") {
        client.set_bearer_token(token);
    }

    println!("Members of list #{} by @{}:", list_id, owner);

    let members = client.user_list_members_stream(&owner, list_id).take(100);
    futures::pin_mut!(members);

    while let Some(user) = members.next().await {
        match user {
            Ok(user) => println!("- @{} ({} followers)", user.screen_name, user.followers_count),
            Err(e) => println!("- couldn't load member: {}", e),
        }
    }

    Ok(())
}
