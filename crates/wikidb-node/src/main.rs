mod health;
mod tracing_init;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use wikidb_common::wire::Role;
use wikidb_common::Config;
use wikidb_coordinator::CoordinatorState;
use wikidb_replica::ReplicaState;
use wikidb_store::Store;

#[derive(Parser)]
#[command(about = "Runs a single wikidb node (coordinator or replica, per config)")]
struct Args {
    /// Path to the node's TOML configuration file.
    #[arg(long, default_value = "wikidb.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::from_file(&args.config).with_context(|| format!("loading {}", args.config.display()))?;

    tracing_init::init(&config.log);

    let role = if config.is_coordinator() { Role::Coordinator } else { Role::Replica };
    info!(this_ip = %config.this_ip, ?role, "starting node");

    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir).with_context(|| format!("creating {}", data_dir.display()))?;
    let store = Arc::new(Store::open(&data_dir).context("opening storage")?);

    let replica_state = Arc::new(ReplicaState {
        store: store.clone(),
        sender: config.this_ip.clone(),
    });

    let mut app = wikidb_replica::router(replica_state).merge(health::router(role));

    if config.is_coordinator() {
        let coordinator_state = Arc::new(CoordinatorState {
            store,
            replicas: config.replicas.clone(),
            client: build_client(),
            prepare_timeout: config.prepare_timeout(),
            commit_timeout: config.commit_timeout(),
        });

        coordinator_state.recover().await.context("resolving transactions left open by a previous run")?;

        app = app.merge(wikidb_coordinator::router(coordinator_state));
    }

    let app = app.layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("binding 0.0.0.0:{}", config.port))?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await.context("serving")?;
    Ok(())
}

fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .expect("reqwest client configuration is static and always valid")
}
