//! Beechain CLI - inspect chain backend bootstrap
//!
//!   beechain resolve [--config <file>] [options]   → resolved rpc connection as JSON
//!   beechain paths [options]                       → files discovery would read
//!
//! Credentials are never printed; certificates are reported by length.

use beechain::backend::light_client::{index_dir, INDEX_FILE};
use beechain::config::default_daemon_dir;
use beechain::credentials::Daemon;
use beechain::logging::init_logging;
use beechain::{
    BackendKind, ChainCode, ChainConfig, ClearNet, ConnectionConfigurer, CredentialResolver, Credentials, NetworkKind,
    NodeConnection,
};
use serde_json::{json, Value};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("beechain {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let result = match opts.command.as_deref() {
        Some("resolve") => cmd_resolve(&opts),
        Some("paths") => cmd_paths(&opts),
        Some(cmd) => Err(format!("Unknown command: {}", cmd)),
        None => {
            print_usage();
            return;
        }
    };

    let pretty = !opts.json && std::io::stdout().is_terminal();
    match result {
        Ok(output) => println!("{}", render(&output, pretty)),
        Err(e) => {
            eprintln!("{}", render(&json!({"error": e}), pretty));
            std::process::exit(1);
        }
    }
}

fn render(value: &Value, pretty: bool) -> String {
    let rendered = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    rendered.unwrap_or_else(|_| value.to_string())
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    config: Option<String>,
    backend: Option<String>,
    chain: Option<String>,
    network: Option<String>,
    rpc_host: Option<String>,
    rpc_user: Option<String>,
    rpc_pass: Option<String>,
    zmq: Option<String>,
    rpc_cert: Option<String>,
    raw_rpc_cert: Option<String>,
    node_dir: Option<String>,
    chain_dir: Option<String>,
    json: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        let mut opts = ParsedArgs::default();
        let mut positional = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            let value = args.get(i + 1).cloned();
            let slot = match arg.as_str() {
                "--help" | "-h" => {
                    opts.help = true;
                    None
                }
                "--version" | "-V" => {
                    opts.version = true;
                    None
                }
                "--json" => {
                    opts.json = true;
                    None
                }
                "--config" | "-c" => Some(&mut opts.config),
                "--backend" | "-b" => Some(&mut opts.backend),
                "--chain" => Some(&mut opts.chain),
                "--network" | "-n" => Some(&mut opts.network),
                "--rpc-host" => Some(&mut opts.rpc_host),
                "--rpc-user" => Some(&mut opts.rpc_user),
                "--rpc-pass" => Some(&mut opts.rpc_pass),
                "--zmq" => Some(&mut opts.zmq),
                "--rpc-cert" => Some(&mut opts.rpc_cert),
                "--raw-rpc-cert" => Some(&mut opts.raw_rpc_cert),
                "--node-dir" => Some(&mut opts.node_dir),
                "--chain-dir" | "-d" => Some(&mut opts.chain_dir),
                _ if !arg.starts_with('-') => {
                    positional.push(arg.clone());
                    None
                }
                _ => None, // Ignore unknown flags
            };
            if let Some(slot) = slot {
                if value.is_some() {
                    *slot = value;
                    i += 1;
                }
            }
            i += 1;
        }

        if !positional.is_empty() {
            opts.command = Some(positional.remove(0));
        }

        // Environment variables (lower priority than CLI args)
        let fallbacks: [(&mut Option<String>, &str); 12] = [
            (&mut opts.config, "BEECHAIN_CONFIG"),
            (&mut opts.backend, "BEECHAIN_BACKEND"),
            (&mut opts.chain, "BEECHAIN_CHAIN"),
            (&mut opts.network, "BEECHAIN_NETWORK"),
            (&mut opts.rpc_host, "BEECHAIN_RPC_HOST"),
            (&mut opts.rpc_user, "BEECHAIN_RPC_USER"),
            (&mut opts.rpc_pass, "BEECHAIN_RPC_PASS"),
            (&mut opts.zmq, "BEECHAIN_ZMQ"),
            (&mut opts.rpc_cert, "BEECHAIN_RPC_CERT"),
            (&mut opts.raw_rpc_cert, "BEECHAIN_RAW_RPC_CERT"),
            (&mut opts.node_dir, "BEECHAIN_NODE_DIR"),
            (&mut opts.chain_dir, "BEECHAIN_CHAIN_DIR"),
        ];
        for (slot, var) in fallbacks {
            if slot.is_none() {
                *slot = env::var(var).ok().filter(|s| !s.is_empty());
            }
        }

        opts
    }
}

fn build_config(opts: &ParsedArgs) -> Result<ChainConfig, String> {
    let mut config = match &opts.config {
        Some(path) => ChainConfig::from_json_file(Path::new(path)).map_err(|e| e.to_string())?,
        None => ChainConfig::default(),
    };

    if let Some(v) = &opts.backend {
        config.backend = BackendKind::from_str(v).ok_or_else(|| format!("Unknown backend: {}", v))?;
    }
    if let Some(v) = &opts.chain {
        config.chain = ChainCode::from_str(v).ok_or_else(|| format!("Unknown chain: {}", v))?;
    }
    if let Some(v) = &opts.network {
        config.network = NetworkKind::from_str(v).ok_or_else(|| format!("Unknown network: {}", v))?;
    }
    if let Some(v) = &opts.chain_dir {
        config.chain_dir = Some(PathBuf::from(v));
    }

    match config.backend {
        BackendKind::FullNodeEvent => {
            let node = &mut config.bitcoind;
            if let Some(v) = &opts.rpc_host { node.rpc_host = v.clone(); }
            if let Some(v) = &opts.rpc_user { node.rpc_user = v.clone(); }
            if let Some(v) = &opts.rpc_pass { node.rpc_pass = v.clone(); }
            if let Some(v) = &opts.zmq { node.zmq_path = v.clone(); }
            if let Some(v) = &opts.node_dir { node.dir = Some(PathBuf::from(v)); }
        }
        BackendKind::FullNodeStream => {
            let node = &mut config.btcd;
            if let Some(v) = &opts.rpc_host { node.rpc_host = v.clone(); }
            if let Some(v) = &opts.rpc_user { node.rpc_user = v.clone(); }
            if let Some(v) = &opts.rpc_pass { node.rpc_pass = v.clone(); }
            if let Some(v) = &opts.node_dir { node.dir = Some(PathBuf::from(v)); }
            if let Some(v) = &opts.raw_rpc_cert { node.raw_rpc_cert = Some(v.clone()); }
            if let Some(v) = &opts.rpc_cert { node.rpc_cert = Some(PathBuf::from(v)); }
            // btcd writes rpc.cert next to its config
            if node.rpc_cert.is_none() && node.raw_rpc_cert.is_none() {
                let dir = node.dir.clone().or_else(|| {
                    Daemon::for_backend(BackendKind::FullNodeStream, config.chain).and_then(|d| default_daemon_dir(d.dir_name))
                });
                node.rpc_cert = dir.map(|d| d.join("rpc.cert"));
            }
        }
        BackendKind::LightClient => {}
    }
    Ok(config)
}

fn cmd_resolve(opts: &ParsedArgs) -> Result<Value, String> {
    let config = build_config(opts)?;
    let params = config.params();
    let explicit = Credentials::from_config(&config);
    let creds = CredentialResolver::from_config(&config)
        .resolve(&explicit, &params)
        .map_err(|e| e.to_string())?;
    debug!("Resolved credentials {:?}", creds);

    let configurer = ConnectionConfigurer::new(Arc::new(ClearNet)).with_probe_timeout(config.probe_timeout());
    let rt = tokio::runtime::Runtime::new().map_err(|e| e.to_string())?;
    let conn = rt.block_on(async {
        match config.backend {
            BackendKind::FullNodeEvent => configurer.event_connection(&config.bitcoind, creds, &params).await.map(Some),
            BackendKind::FullNodeStream => configurer.stream_connection(&config.btcd, creds, &params).await.map(Some),
            BackendKind::LightClient => Ok(None),
        }
    }).map_err(|e| e.to_string())?;

    let mut out = json!({
        "backend": config.backend.as_str(),
        "chain": params.chain.as_str(),
        "network": params.name,
        "routing_policy": config.routing_policy(),
    });
    match conn {
        Some(conn) => out["connection"] = connection_json(&conn),
        None => {
            out["index_dir"] = json!(index_dir(&config.chain_dir(), params.normalized_name()));
            out["peers"] = json!({"add": config.neutrino.add_peers, "connect": config.neutrino.connect_peers});
        }
    }
    Ok(out)
}

fn connection_json(conn: &NodeConnection) -> Value {
    json!({
        "host": conn.host,
        "user": conn.user,
        "password": "<redacted>",
        "event_stream": conn.event_stream,
        "endpoint": conn.transport.endpoint(),
        "tls": conn.transport.tls_enabled(),
        "tls_cert_len": conn.tls_cert.as_ref().map(Vec::len),
    })
}

fn cmd_paths(opts: &ParsedArgs) -> Result<Value, String> {
    let config = build_config(opts)?;
    let params = config.params();
    let chain_dir = config.chain_dir();
    let index = index_dir(&chain_dir, params.normalized_name());

    let mut out = json!({
        "backend": config.backend.as_str(),
        "chain_dir": chain_dir,
        "light_client_index": index.join(INDEX_FILE),
    });
    if config.backend.is_full_node() {
        let resolver = CredentialResolver::from_config(&config);
        out["node_config"] = json!(resolver.config_file().map_err(|e| e.to_string())?);
        out["cookie"] = json!(resolver.cookie_file(&params).map_err(|e| e.to_string())?);
        if config.backend == BackendKind::FullNodeStream {
            out["rpc_cert"] = json!(config.btcd.rpc_cert);
        }
    }
    Ok(out)
}

fn print_usage() {
    println!(
        r#"beechain - Chain backend bootstrap

USAGE:
    beechain <command> [options]

COMMANDS:
    resolve                 Resolve credentials and rpc connection (JSON)
    paths                   Show files and directories discovery would use

OPTIONS:
    --config, -c <file>     JSON chain config (env: BEECHAIN_CONFIG)
    --backend, -b <name>    bitcoind|btcd|neutrino (env: BEECHAIN_BACKEND)
    --chain <name>          bitcoin|litecoin (env: BEECHAIN_CHAIN)
    --network, -n <net>     mainnet|testnet|regtest|simnet (env: BEECHAIN_NETWORK)
    --rpc-host <host>       Node rpc host, port optional (env: BEECHAIN_RPC_HOST)
    --rpc-user <user>       Node rpc user (env: BEECHAIN_RPC_USER)
    --rpc-pass <pass>       Node rpc password (env: BEECHAIN_RPC_PASS)
    --zmq <endpoint>        zmqpubrawblock endpoint, bitcoind only (env: BEECHAIN_ZMQ)
    --rpc-cert <path>       btcd rpc certificate (env: BEECHAIN_RPC_CERT)
    --raw-rpc-cert <hex>    btcd rpc certificate, hex (env: BEECHAIN_RAW_RPC_CERT)
    --node-dir <path>       Node config directory (env: BEECHAIN_NODE_DIR)
    --chain-dir, -d <path>  Chain data directory (env: BEECHAIN_CHAIN_DIR)

OUTPUT OPTIONS:
    --json                  Compact JSON output
    --version, -V           Print version

Leave rpc user, password and zmq unset to read them from the node's own
config file or cookie."#
    );
}
