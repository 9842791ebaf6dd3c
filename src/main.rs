//! Interactive TN3270 client
//!
//! Reads commands from stdin. Lines starting with `:` are keys or
//! commands; anything else is typed at the cursor.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use log::{error, info};

use tn3270r::config::{self, PORT, STRICT_COMMANDS, TERMINAL_TYPE};
use tn3270r::{Screen, Session, TN3270Error};

fn print_help() {
    println!("TN3270R - TN3270 terminal client");
    println!();
    println!("Usage: tn3270r [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --server <host> or -s <host>        Host to connect to");
    println!("  --port <port> or -p <port>          Port to connect to (default: 23)");
    println!("  --config <path> or -c <path>        Session configuration file");
    println!("  --terminal-type <name>              Terminal type sent to the host");
    println!("  --strict                            Reject unknown 3270 command bytes");
    println!("  --help or -h                        Show this help message");
    println!();
    println!("Commands once connected:");
    println!("  :enter  :clear  :pf <n>  :pa <n>  :tab  :home  :insert  :show  :quit");
    println!("  any other line is typed at the cursor");
}

struct CliOptions {
    server: Option<String>,
    port: Option<u16>,
    config_path: Option<PathBuf>,
    terminal_type: Option<String>,
    strict: bool,
}

fn parse_args(args: &[String]) -> Result<Option<CliOptions>> {
    let mut options = CliOptions {
        server: None,
        port: None,
        config_path: None,
        terminal_type: None,
        strict: false,
    };

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--server" | "-s" => {
                options.server = Some(iter.next().context("--server requires a value")?.clone());
            }
            "--port" | "-p" => {
                let value = iter.next().context("--port requires a value")?;
                options.port = Some(value.parse().with_context(|| format!("invalid port '{}'", value))?);
            }
            "--config" | "-c" => {
                options.config_path = Some(PathBuf::from(iter.next().context("--config requires a path")?));
            }
            "--terminal-type" => {
                options.terminal_type = Some(iter.next().context("--terminal-type requires a value")?.clone());
            }
            "--strict" => options.strict = true,
            "--help" | "-h" => {
                print_help();
                return Ok(None);
            }
            other => bail!("unknown argument '{}', see --help", other),
        }
    }
    Ok(Some(options))
}

fn key_number(arg: Option<&str>, key: &str) -> Result<u8> {
    let value = arg.with_context(|| format!(":{} requires a number", key))?;
    value
        .parse()
        .with_context(|| format!("invalid {} number '{}'", key, value))
}

/// Run one input line. Returns false when the user asked to quit.
fn handle_line(screen: &Screen, line: &str) -> Result<bool> {
    let Some(command) = line.strip_prefix(':') else {
        screen.put_string(line)?;
        return Ok(true);
    };

    let mut parts = command.split_whitespace();
    let outcome = match parts.next().unwrap_or("") {
        "quit" | "q" => return Ok(false),
        "enter" => screen.enter(),
        "clear" => screen.clear(),
        "pf" => screen.pf(key_number(parts.next(), "pf")?),
        "pa" => screen.pa(key_number(parts.next(), "pa")?),
        "tab" => screen.tab(),
        "home" => screen.home(),
        "insert" => {
            screen.set_insert_mode(!screen.is_insert_mode());
            println!("insert mode {}", if screen.is_insert_mode() { "on" } else { "off" });
            Ok(())
        }
        "show" => Ok(()),
        other => {
            println!("unknown command ':{}'", other);
            return Ok(true);
        }
    };

    match outcome {
        Ok(()) => {}
        // The reply may still arrive; show what we have
        Err(e) if e.is_timeout() => println!("warning: {}", e),
        Err(e) => return Err(e.into()),
    }
    println!("{}", screen.screen_text()?);
    Ok(true)
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let Some(options) = parse_args(&args)? else {
        return Ok(());
    };

    let path = options.config_path.clone().unwrap_or_else(config::default_config_path);
    let mut session_config = config::load_config(&path)
        .with_context(|| format!("loading configuration from {}", path.display()))?;
    if let Some(port) = options.port {
        session_config.set_property(PORT, i64::from(port));
    }
    if let Some(terminal_type) = &options.terminal_type {
        session_config.set_property(TERMINAL_TYPE, terminal_type.as_str());
    }
    if options.strict {
        session_config.set_property(STRICT_COMMANDS, true);
    }

    let host = options.server.clone().unwrap_or_else(|| session_config.host());
    if host.is_empty() {
        print_help();
        bail!("no host given; use --server or set connection.host in {}", path.display());
    }
    let port = session_config.port();

    let mut session = Session::new(session_config);
    session
        .connect(&host, port)
        .with_context(|| format!("connecting to {}:{}", host, port))?;
    info!("session established with {}:{}", host, port);

    // Give the host a moment to paint its first screen
    if !session.wait_for_update(Duration::from_secs(2))? {
        info!("no initial screen from host yet");
    }

    let screen = session.screen()?;
    println!("{}", screen.screen_text()?);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line?;
        if !session.is_connected() {
            println!("connection closed by host");
            break;
        }
        match handle_line(&screen, line.trim_end()) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => match e.downcast_ref::<TN3270Error>() {
                Some(err) if err.is_transport() => return Err(e),
                _ => println!("error: {:#}", e),
            },
        }
        stdout.flush()?;
    }

    session.disconnect();
    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
