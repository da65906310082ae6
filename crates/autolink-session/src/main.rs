//! `autolink`: connect to an MCU bridge and run the steering-wheel dispatcher.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use autolink_session::{
    LinkSession, LoggingHost, RadioLinkState, SessionConfig, SessionError, TcpTransport,
};
use clap::Parser;
use crossbeam_channel::select;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "autolink")]
#[command(about = "Head-unit MCU link: handshake, button dispatch and radio control")]
struct Args {
    /// YAML session configuration.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address of the serial-to-TCP bridge.
    #[arg(long, default_value = "127.0.0.1:5760")]
    connect: String,

    /// Enable the radio module after connecting.
    #[arg(long)]
    radio: bool,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print raw button and dimmer readings instead of running actions.
    #[arg(long)]
    learn: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), SessionError> {
    let config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };

    let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = stop_tx.try_send(());
    })
    .map_err(|e| SessionError::Config(format!("cannot install Ctrl-C handler: {}", e)))?;

    let transport = Arc::new(TcpTransport::new(args.connect.clone())?);
    let session = LinkSession::new(config, transport, Arc::new(LoggingHost::default()));

    info!("Connecting to {}", args.connect);
    session.connect()?;

    if args.radio {
        if session.enable_radio()? {
            let radio = session.radio();
            radio.power(true)?;
            let snapshot = session.radio_snapshot();
            radio.tune(snapshot.tune.band, snapshot.tune.frequency, snapshot.subchannel)?;
        } else {
            warn!("No radio attached");
        }
    }

    if args.learn {
        let events = session.dispatcher().start_learning();
        thread::Builder::new()
            .name("learn".to_string())
            .spawn(move || {
                for event in events.iter() {
                    println!("{:?}", event);
                }
            })
            .map_err(|e| SessionError::Config(e.to_string()))?;
    }

    loop {
        select! {
            recv(stop_rx) -> _ => break,
            default(Duration::from_secs(1)) => {
                let status = session.status();
                if !status.connected {
                    warn!(
                        "Link lost: {}",
                        status.reason.unwrap_or_else(|| status.state.to_string())
                    );
                    break;
                }
            }
        }
    }

    if session.radio_state() == RadioLinkState::Enabled {
        match serde_yaml::to_string(&session.radio_snapshot()) {
            Ok(yaml) => info!("Radio settings:\n{}", yaml),
            Err(e) => warn!("Cannot render radio settings: {}", e),
        }
    }
    session.disconnect();
    info!("Bye");
    Ok(())
}
