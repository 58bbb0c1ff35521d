use std::{sync::Arc, time::Duration};

use arg::{Args, ParseError, ParseKind};
use tracing::info;

use castdir::{config::DirectorySettings, directory::ChannelDirectory, ArgParse};

#[tokio::main]
async fn main() {
    let args     = Vec::from_iter(std::env::args());
    let mut args = args.iter().map(AsRef::as_ref).collect::<Vec<_>>();
    // Remove executable
    args.remove(0);
    let args = match ArgParse::from_args(args) {
        Ok(v) => v,
        Err(e) => {
            if let ParseKind::Top(ParseError::HelpRequested(help)) = e {
                eprintln!("{}", help);
                std::process::exit(1);
            }
            eprintln!("Error parsing cmd line args: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt().with_thread_names(true).with_max_level(tracing::Level::DEBUG).init();

    if args.gen {
        DirectorySettings::create_default(&args.config_file);
        std::process::exit(0);
    }
    if args.verify {
        let config = DirectorySettings::load(&args.config_file);
        config.verify();
        std::process::exit(0);
    }

    let config = DirectorySettings::load(&args.config_file);
    config.verify();

    let directory = Arc::new(ChannelDirectory::new(&config));
    for feed in &config.feeds {
        directory.add_feed(feed).await;
    }
    info!("Aggregating {} feeds", directory.num_feeds().await);

    // The refresh interval owns how often we actually hit the feeds,
    // the tick below is only how often we ask
    let mut interval = tokio::time::interval(Duration::from_secs(30));
    loop {
        interval.tick().await;
        if directory.update().await {
            info!(
                "Directory refreshed: {} channels from {} feeds, {} listeners, {} relays",
                directory.num_channels().await,
                directory.num_feeds().await,
                directory.total_listeners().await,
                directory.total_relays().await
            );
        }
    }
}
