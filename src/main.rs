use std::net::SocketAddr;
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand};
use thaiid::reader::CardReader;
use thaiid::{server, session};

#[derive(Debug, Parser)]
#[command(name = "thaiid", about = "Thai national ID card reader agent")]
struct Opt {
    /// Every time you -v, it gets noisier (up to -vvv).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Pause between card commands, in milliseconds. Slow readers return
    /// empty replies without one; lower at your own risk.
    #[arg(long, default_value_t = 100, global = true)]
    delay_ms: u64,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List all connected readers.
    Readers,

    /// Read the card in the first reader and print the record as JSON.
    Read,

    /// Serve the HTTP API.
    Serve {
        #[arg(long, default_value = "0.0.0.0:8080")]
        addr: SocketAddr,
    },
}

fn init_logging(opt: &Opt) {
    tracing_subscriber::fmt()
        .with_env_filter(match opt.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
        .init();
}

fn main() -> anyhow::Result<()> {
    let opt = Opt::parse();
    init_logging(&opt);
    let delay = Duration::from_millis(opt.delay_ms);

    match opt.cmd {
        Command::Readers => {
            for (i, name) in session::list_readers()?.iter().enumerate() {
                println!("{:3}  {}", i, name);
            }
            Ok(())
        }
        Command::Read => {
            let record = CardReader::with_delay(session::connect()?, delay).read()?;
            serde_json::to_writer_pretty(std::io::stdout().lock(), &record)?;
            println!();
            Ok(())
        }
        Command::Serve { addr } => {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            rt.block_on(server::serve(addr, delay))?;
            Ok(())
        }
    }
}
