//! LFU Cache - interactive shell
//!
//! Reads commands from stdin and runs them against an in-process
//! `LfuCache<String, String>` configured from the environment.

use anyhow::Result;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lfu_cache::{CacheConfig, LfuCache};

const HELP: &str = "commands: set <key> <value> | get <key> | len | stats | help | quit";

// == Command ==
/// One parsed shell line.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Set { key: String, value: String },
    Get { key: String },
    Len,
    Stats,
    Help,
    Quit,
}

impl Command {
    /// Parses a line. Values may contain spaces; keys may not.
    fn parse(line: &str) -> std::result::Result<Self, String> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        match verb.to_ascii_lowercase().as_str() {
            "set" => match rest.split_once(char::is_whitespace) {
                Some((key, value)) => Ok(Command::Set {
                    key: key.to_string(),
                    value: value.trim().to_string(),
                }),
                None => Err("usage: set <key> <value>".to_string()),
            },
            "get" if !rest.is_empty() && !rest.contains(char::is_whitespace) => Ok(Command::Get {
                key: rest.to_string(),
            }),
            "get" => Err("usage: get <key>".to_string()),
            "len" => Ok(Command::Len),
            "stats" => Ok(Command::Stats),
            "help" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(format!("unknown command '{}'", other)),
        }
    }
}

/// Main entry point for the LFU cache shell.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache (starts the expiry sweeper)
/// 4. Execute stdin commands until `quit`, EOF or Ctrl+C
/// 5. Stop the sweeper and log final statistics
#[tokio::main]
async fn main() -> Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lfu_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = CacheConfig::from_env();
    info!(
        "Configuration loaded: capacity={}, ttl={:?}, cleanup_interval={:?}",
        config.capacity, config.ttl, config.cleanup_interval
    );

    let cache = LfuCache::with_eviction_callback(config, |key: String, value: String| {
        info!("Evicted {}={}", key, value);
    })?;

    println!("{}", HELP);
    let mut lines = BufReader::new(io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        };
        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match Command::parse(&line) {
            Ok(Command::Set { key, value }) => {
                cache.set(key, value);
                println!("OK");
            }
            Ok(Command::Get { key }) => match cache.get(key.as_str()) {
                Some(value) => println!("{}", value),
                None => println!("(nil)"),
            },
            Ok(Command::Len) => println!("{}", cache.len()),
            Ok(Command::Stats) => println!("{}", serde_json::to_string(&cache.stats())?),
            Ok(Command::Help) => println!("{}", HELP),
            Ok(Command::Quit) => break,
            Err(message) => println!("error: {}", message),
        }
    }

    cache.stop();
    let stats = cache.stats();
    info!(
        "Final stats: hits={}, misses={}, evictions={}, hit_rate={:.2}",
        stats.hits,
        stats.misses,
        stats.evictions,
        stats.hit_rate()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set_keeps_spaces_in_value() {
        assert_eq!(
            Command::parse("set greeting hello there"),
            Ok(Command::Set {
                key: "greeting".to_string(),
                value: "hello there".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_get() {
        assert_eq!(
            Command::parse("  GET foo "),
            Ok(Command::Get { key: "foo".to_string() })
        );
        assert!(Command::parse("get").is_err());
        assert!(Command::parse("get a b").is_err());
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(Command::parse("len"), Ok(Command::Len));
        assert_eq!(Command::parse("stats"), Ok(Command::Stats));
        assert_eq!(Command::parse("help"), Ok(Command::Help));
        assert_eq!(Command::parse("exit"), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse("set onlykey").is_err());
        assert_eq!(
            Command::parse("flush"),
            Err("unknown command 'flush'".to_string())
        );
    }
}
