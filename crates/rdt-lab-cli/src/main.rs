use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use rdt_lab_agents::{ReceiverAgent, ReceiverConfig, SenderAgent, SenderConfig, TransferReport};
use rdt_lab_channel::{ImpairmentOverride, ImpairmentProfile, RelayNode};
use rdt_lab_transport::{Endpoint, UdpEndpoint};
use rdt_lab_wire::FRAME_CAPACITY;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Stop-and-wait ARQ lab: sender, receiver and impairment relay over UDP"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the impairment relay between sender and receiver.
    Relay(RelayArgs),
    /// Send a message through the relay to the receiver.
    Sender(SenderArgs),
    /// Listen for segments and print reassembled messages.
    Receiver(ReceiverArgs),
}

#[derive(clap::Args, Debug)]
struct RelayArgs {
    /// Port the relay listens on.
    #[arg(long)]
    port: u16,

    /// Percent chance a packet is lost (0-100).
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=100))]
    loss: u8,

    /// Percent chance a packet is delayed (0-100).
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=100))]
    delay: u8,

    /// Percent chance a packet is corrupted (0-100).
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=100))]
    corrupt: u8,

    /// How long a delayed packet is held before forwarding, in milliseconds.
    #[arg(long, default_value_t = 4000)]
    delay_ms: u64,

    /// Seed for deterministic impairment decisions.
    #[arg(long)]
    seed: Option<u64>,

    /// TOML file overriding the impairment profile.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = FRAME_CAPACITY)]
    frame_capacity: usize,
}

#[derive(clap::Args, Debug)]
struct SenderArgs {
    /// Local port to bind.
    #[arg(long)]
    port: u16,

    #[arg(long, default_value = "127.0.0.1")]
    receiver_ip: IpAddr,
    #[arg(long)]
    receiver_port: u16,

    #[arg(long, default_value = "127.0.0.1")]
    relay_ip: IpAddr,
    #[arg(long)]
    relay_port: u16,

    /// Message to transfer.
    #[arg(long)]
    message: String,

    /// Also send the shutdown sentinel once the message is delivered.
    #[arg(long, default_value_t = false)]
    stop: bool,

    /// Acknowledgment timeout in milliseconds.
    #[arg(long, default_value_t = 4000)]
    timeout_ms: u64,

    /// Per-segment retry bound; omit to retry forever.
    #[arg(long)]
    max_attempts: Option<u32>,

    #[arg(long, default_value_t = FRAME_CAPACITY)]
    frame_capacity: usize,

    /// Write the transfer report as JSON.
    #[arg(long)]
    report_out: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct ReceiverArgs {
    /// Port the receiver listens on.
    #[arg(long)]
    port: u16,

    #[arg(long, default_value_t = FRAME_CAPACITY)]
    frame_capacity: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    match args.command {
        Command::Relay(args) => run_relay(args).await,
        Command::Sender(args) => run_sender(args).await,
        Command::Receiver(args) => run_receiver(args).await,
    }
}

fn any_port(port: u16) -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port)
}

async fn run_relay(args: RelayArgs) -> Result<()> {
    let mut profile = ImpairmentProfile {
        loss_percent: args.loss,
        delay_percent: args.delay,
        corrupt_percent: args.corrupt,
        delay_ms: args.delay_ms,
        seed: args.seed,
    };
    if let Some(path) = &args.config {
        load_overrides(path)?.apply_to(&mut profile);
    }

    let endpoint = UdpEndpoint::bind(any_port(args.port)).await?;
    info!(port = args.port, ?profile, "starting relay");

    let mut relay = RelayNode::new(endpoint, profile, args.frame_capacity);
    relay.run().await?;
    Ok(())
}

fn load_overrides(path: &Path) -> Result<ImpairmentOverride> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    toml::from_str(&content).context("Failed to parse impairment config")
}

async fn run_sender(args: SenderArgs) -> Result<()> {
    let endpoint = UdpEndpoint::bind(any_port(args.port)).await?;
    // The advertised return address; peers on the same host reach the
    // sender back through the relay at this address.
    let return_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), args.port);

    let config = SenderConfig {
        return_addr,
        receiver_addr: SocketAddr::new(args.receiver_ip, args.receiver_port),
        relay_addr: SocketAddr::new(args.relay_ip, args.relay_port),
        ack_timeout: Duration::from_millis(args.timeout_ms),
        max_attempts: args.max_attempts,
        frame_capacity: args.frame_capacity,
    };
    info!(port = args.port, relay = %config.relay_addr, "starting sender");

    let agent = SenderAgent::new(endpoint, config);
    let report = agent.send_message(args.message.as_bytes()).await?;
    if args.stop {
        agent.shutdown().await?;
    }

    if let Some(path) = &args.report_out {
        write_report(path, &report)?;
    }
    Ok(())
}

fn write_report(path: &Path, report: &TransferReport) -> Result<()> {
    let data = serde_json::to_vec_pretty(report).context("Failed to serialize transfer report")?;
    fs::write(path, &data)
        .with_context(|| format!("Failed to write report file {}", path.display()))?;
    Ok(())
}

async fn run_receiver(args: ReceiverArgs) -> Result<()> {
    let endpoint = UdpEndpoint::bind(any_port(args.port)).await?;
    info!(local = %endpoint.local_addr()?, "receiver listening");

    let mut agent = ReceiverAgent::new(
        endpoint,
        ReceiverConfig {
            frame_capacity: args.frame_capacity,
        },
    );
    let report = agent
        .run(|message| {
            println!("FINAL MESSAGE: {}", String::from_utf8_lossy(&message));
        })
        .await?;

    info!(
        messages = report.messages,
        duplicates = report.duplicates,
        "receiver stopped"
    );
    Ok(())
}
