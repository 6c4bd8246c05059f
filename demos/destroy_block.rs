use twasync::client::Client;
use twasync::config::Config;
use twasync::user::UserModel;

macro_rules! input {
    ($($arg:tt)*) => ({
        use std::io::prelude::*;

        print!($($arg)*);

        let mut buffer = String::new();

        std::io::stdout()
            .flush()
            .and_then(|_| std::io::stdin().read_line(&mut buffer))
            .map(move |_| if buffer.trim().is_empty() {
                None
            } else {
                Some(String::from(buffer.trim()))
            })
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut client = Client::with_config(Config::from_env()?)?;

    let username = input!("Username: ")?.unwrap_or_default();
    let password = input!("Password: ")?.unwrap_or_default();
    client.login(username, password);

    let Some(screen_name) = input!("Unblock: @")? else {
        println!("nobody to unblock");
        return Ok(());
    };

    let mut user = client.destroy_block(screen_name.as_str())?;

    match user.get() {
        Ok(user) => println!("unblocked @{}", user.screen_name()?),
        Err(e) => println!("couldn't unblock @{}: {}", screen_name, e),
    }

    Ok(())
}
