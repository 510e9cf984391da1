use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use wikidb_common::config::LogConfig;

pub fn init(config: &LogConfig) {
    let format = tracing_subscriber::fmt::format()
        .with_line_number(true)
        .with_file(true)
        .with_target(false)
        .compact();

    let fmt_layer = tracing_subscriber::fmt::layer().event_format(format);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.directive));

    tracing_subscriber::Registry::default()
        .with(fmt_layer)
        .with(env_filter)
        .init();
}
