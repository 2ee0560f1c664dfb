//! netstat command - list IPv4 TCP and UDP connections.
//!
//! A small netstat built on the xpcb snapshot decoder: one kernel query per
//! protocol, then a pure in-memory decode.

use clap::Parser;
use xpcb::output::{self, DisplayOptions, OutputFormat};
use xpcb::{Protocol, Snapshot};

#[derive(Parser)]
#[command(name = "netstat", version, about = "List IPv4 TCP and UDP connections")]
struct Cli {
    /// Display TCP sockets.
    #[arg(short = 't', long)]
    tcp: bool,

    /// Display UDP sockets.
    #[arg(short = 'u', long)]
    udp: bool,

    /// Include listening and unconnected sockets.
    #[arg(short = 'a', long)]
    all: bool,

    /// Display listening TCP sockets only.
    #[arg(short = 'l', long)]
    listening: bool,

    /// Numeric output (always on; accepted for netstat compatibility).
    #[arg(short = 'n', long)]
    numeric: bool,

    /// Show lifetime rx/tx byte counts.
    #[arg(short = 'b', long)]
    bytes: bool,

    /// Don't display the header.
    #[arg(short = 'H', long)]
    no_header: bool,

    /// Output in JSON format.
    #[arg(short = 'j', long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Default to both protocols; -l implies TCP only since UDP never listens.
    let query_tcp = cli.tcp || !cli.udp;
    let query_udp = (cli.udp || !cli.tcp) && !cli.listening;

    let mut entries = Vec::new();
    if query_tcp {
        entries.extend(Snapshot::entries(Protocol::Tcp)?);
    }
    if query_udp {
        entries.extend(Snapshot::entries(Protocol::Udp)?);
    }

    entries.retain(|e| {
        if cli.listening {
            e.is_listening()
        } else if cli.all {
            true
        } else {
            // netstat's default view: connected sockets only.
            !e.is_listening() && !e.is_unconnected()
        }
    });

    let opts = DisplayOptions {
        no_header: cli.no_header,
        bytes: cli.bytes,
        numeric: cli.numeric,
    };

    let mut stdout = std::io::stdout().lock();
    match format {
        OutputFormat::Json => output::print_json(&entries, &mut stdout)?,
        OutputFormat::Text => output::print_text(&entries, &opts, &mut stdout)?,
    }

    Ok(())
}
