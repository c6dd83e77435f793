//! edm-demo-sim — serial-line hardware emulator for the Mato MTS-602R+.
//!
//! Listens on a real (or pty-paired) serial port, watches for the
//! three-byte measurement command, and replies with a synthesized frame
//! so the real Transport/Translator/Codec path can be exercised without a
//! physical total station.

mod station;
mod wire;

use clap::Parser;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::SerialPortBuilderExt;
use tracing::{info, warn};

use edm_types::CircleType;
use station::{Mode, Station};

#[derive(Parser, Debug)]
#[command(name = "edm-demo-sim", about = "Mato MTS-602R+ serial emulator")]
struct Args {
    /// Serial port to listen on (e.g. a pty side created with socat).
    #[arg(long)]
    port: String,
    /// Baud rate.
    #[arg(long, default_value_t = 9600)]
    baud: u32,
    /// Circle type governing edge/throw magnitudes.
    #[arg(long, value_enum, default_value = "shot")]
    circle: ArgCircleType,
    /// Which reading to synthesise for every incoming command.
    #[arg(long, value_enum, default_value = "centre")]
    mode: Mode,
    /// Device identifier passed to the demo generator (keeps station state
    /// stable across reconnects within one process run).
    #[arg(long, default_value = "emulated-1")]
    device_id: String,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ArgCircleType {
    Shot,
    Discus,
    Hammer,
    Javelin,
}

impl From<ArgCircleType> for CircleType {
    fn from(a: ArgCircleType) -> Self {
        match a {
            ArgCircleType::Shot => CircleType::Shot,
            ArgCircleType::Discus => CircleType::Discus,
            ArgCircleType::Hammer => CircleType::Hammer,
            ArgCircleType::Javelin => CircleType::JavelinArc,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "edm_demo_sim=info".into()),
        )
        .init();

    let args = Args::parse();
    let station = Station::new(args.device_id.clone(), args.circle.into(), args.mode);

    info!("edm-demo-sim listening on {} at {} baud ({:?} mode)", args.port, args.baud, args.mode);

    let mut port = tokio_serial::new(&args.port, args.baud)
        .open_native_async()
        .map_err(|e| anyhow::anyhow!("failed to open {}: {e}", args.port))?;

    let mut buf = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match port.read(&mut byte).await {
            Ok(0) => {
                warn!("serial port closed by peer");
                break;
            }
            Ok(_) => {
                buf.push(byte[0]);
                if buf.len() > 64 {
                    buf.drain(0..buf.len() - 3);
                }
                if wire::ends_with_command(&buf) {
                    buf.clear();
                    let reading = station.next_reading();
                    let frame = wire::encode_frame(&reading);
                    if let Err(e) = port.write_all(&frame).await {
                        warn!("write failed: {e}");
                    } else {
                        info!("replied sd={:.0}mm va={:.4} har={:.4}", reading.slope_distance_mm, reading.vertical_angle_deg, reading.horizontal_angle_deg);
                    }
                }
            }
            Err(e) => {
                warn!("read failed: {e}");
                break;
            }
        }
    }

    Ok(())
}
