//! waypoint-ctl — command-line interface for the Waypoint directory.

use anyhow::{Context, Result, bail};

use waypoint_core::Network;

mod cmd;

use cmd::http::Endpoint;
use cmd::ping::PingOptions;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;

fn print_usage() {
    println!("Usage: waypoint-ctl [--host <host>] [--port <port>] <command>");
    println!();
    println!("Commands:");
    println!("  status                    Show directory status and fork rules");
    println!("  identity                  Show the directory's signing address");
    println!("  peers [MAIN|TEST]         List live peers (signature checked)");
    println!("  ping <host> <port>        Announce a peer and print the pong");
    println!();
    println!("Ping options:");
    println!("  --network <MAIN|TEST>     Peer network (default: MAIN)");
    println!("  --key <path>              Peer key file (default: {})", cmd::ping::DEFAULT_PEER_KEY);
    println!("  --version <semver>        Advertised software version");
    println!("  --height <n>              Head block height (default: 0)");
    println!("  --head <hex>              Head block hash");
    println!("  --difficulty <n>          Total difficulty, decimal (default: 0)");
    println!();
    println!("Options:");
    println!("  --host <host>   Directory host (default: {})", DEFAULT_HOST);
    println!("  --port <port>   Directory API port (default: {})", DEFAULT_PORT);
}

fn parse_ping(args: &[&str]) -> Result<PingOptions> {
    let mut positional = Vec::new();
    let mut flags = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if let Some(name) = args[i].strip_prefix("--") {
            let value = args
                .get(i + 1)
                .with_context(|| format!("--{} requires a value", name))?;
            flags.push((name, *value));
            i += 2;
        } else {
            positional.push(args[i]);
            i += 1;
        }
    }

    let [host, port] = positional.as_slice() else {
        bail!("ping requires <host> <port>");
    };
    let port = port.parse().context("port must be a number")?;
    let mut opts = PingOptions::new(host.to_string(), port);

    for (name, value) in flags {
        match name {
            "network" => {
                opts.network = value.parse::<Network>().map_err(anyhow::Error::msg)?;
            }
            "key" => opts.key_file = value.into(),
            "version" => opts.software_version = value.to_string(),
            "height" => opts.head_height = value.parse().context("--height must be a number")?,
            "head" => opts.head_hash = value.parse().context("--head must be a 32-byte hex hash")?,
            "difficulty" => {
                opts.total_difficulty = primitive_types::U256::from_dec_str(value)
                    .map_err(|e| anyhow::anyhow!("--difficulty: {:?}", e))?;
            }
            other => bail!("unknown ping option --{}", other),
        }
    }
    Ok(opts)
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut endpoint = Endpoint {
        host: DEFAULT_HOST.to_string(),
        port: DEFAULT_PORT,
    };
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--port" => {
                i += 1;
                endpoint.port = args
                    .get(i)
                    .context("--port requires a value")?
                    .parse()
                    .context("--port must be a number")?;
            }
            "--host" => {
                i += 1;
                endpoint.host = args.get(i).context("--host requires a value")?.clone();
            }
            _ => remaining.push(&args[i]),
        }
        i += 1;
    }

    match remaining.as_slice() {
        ["status"] | [] => cmd::status::cmd_status(&endpoint).await,
        ["identity"] => cmd::identity::cmd_identity(&endpoint).await,
        ["peers"] => cmd::peers::cmd_peers(&endpoint, None).await,
        ["peers", network] => {
            let network = network.parse::<Network>().map_err(anyhow::Error::msg)?;
            cmd::peers::cmd_peers(&endpoint, Some(network)).await
        }
        ["ping", rest @ ..] => {
            let opts = parse_ping(rest)?;
            cmd::ping::cmd_ping(&endpoint, &opts).await
        }
        ["help"] | ["--help"] | ["-h"] => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_arguments_parse() {
        let opts = parse_ping(&[
            "10.0.0.5",
            "30303",
            "--network",
            "test",
            "--height",
            "42",
            "--difficulty",
            "123456789012345678901234567890",
        ])
        .unwrap();
        assert_eq!(opts.listen_host, "10.0.0.5");
        assert_eq!(opts.listen_port, 30303);
        assert_eq!(opts.network, Network::Test);
        assert_eq!(opts.head_height, 42);
        assert_eq!(
            opts.total_difficulty.to_string(),
            "123456789012345678901234567890"
        );
    }

    #[test]
    fn ping_requires_host_and_port() {
        assert!(parse_ping(&["10.0.0.5"]).is_err());
        assert!(parse_ping(&["10.0.0.5", "notaport"]).is_err());
        assert!(parse_ping(&["10.0.0.5", "1", "--bogus", "x"]).is_err());
        assert!(parse_ping(&["10.0.0.5", "1", "--height"]).is_err());
    }
}
