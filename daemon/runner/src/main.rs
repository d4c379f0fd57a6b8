//! `pvfs2-server`: loads configuration, stands up a `daemon_core::Server` over
//! in-process transport stand-ins (§1's Non-goals: no BMI/Trove/flow implementation
//! is in scope here), and runs its dispatch loop.

use clap::{App, Arg};
use daemon_core::Server;
use pvfs_job::transport::stub::{StubFlow, StubNetwork, StubStorage};
use pvfs_support::config::EngineConfig;
use pvfs_support::logging::info;
use std::thread;
use std::time::Duration;

fn main() {
    let matches = App::new("pvfs2-server")
        .version("1.0")
        .about("Request scheduler and state-machine driver daemon")
        .arg(Arg::with_name("config").short("c").long("config").help("Path to a server configuration TOML file").takes_value(true))
        .arg(Arg::with_name("log-level").short("l").long("log-level").help("trace, debug, info, warning, error").takes_value(true))
        .arg(Arg::with_name("listen-address").short("a").long("listen").help("Overrides the configured listen address").takes_value(true))
        .get_matches();

    let mut config = match matches.value_of("config") {
        Some(path) => EngineConfig::load(path),
        None => EngineConfig::default(),
    };
    if let Some(address) = matches.value_of("listen-address") {
        config.listen_address = address.to_string();
    }

    let log = pvfs_support::logging::init(matches.value_of("log-level").unwrap_or("info"));
    info!(log, "starting server"; "listen_address" => config.listen_address.as_str(), "context_count" => config.context_count);

    let server = Server::new(
        config,
        Box::new(StubNetwork::new()),
        Box::new(StubStorage::new()),
        Box::new(StubFlow::new()),
        log.new(pvfs_support::logging::o!()),
    );

    // No real network listener is wired up in this build, so the dispatch loop runs
    // for a bounded number of ticks rather than blocking on an accept loop.
    for _ in 0..64 {
        server.tick();
        thread::sleep(Duration::from_millis(10));
    }

    info!(log, "shutting down server");
    server.finalize();
}
