use futures::prelude::*;
use twasync::client::Client;
use twasync::search::{Query, ResultType};

#[tokio::main]
async fn main() -> twasync::error::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let terms = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let terms = if terms.is_empty() { String::from("#rust") } else { terms };

    let client = Client::new("MyProject/1.0")?;

    println!("Twenty recent tweets about {}!", terms);

    let query = Query::new(terms)
        .per_page(20)
        .result_type(ResultType::Recent);

    let tweets = client.search_stream(query).take(20);
    futures::pin_mut!(tweets);

    while let Some(tweet) = tweets.next().await {
        match tweet {
            Ok(tweet) => println!("- @{}: {}", tweet.from_user, tweet.text),
            Err(e) => println!("- couldn't load tweet: {}", e),
        }
    }

    Ok(())
}
