//! One-shot upload client entry point.

use std::net::SocketAddr;
use std::path::Path;

use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "127.0.0.1:7070";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let file = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("usage: filestat-send <file> [address]"))?;
    let addr: SocketAddr = args.next().as_deref().unwrap_or(DEFAULT_ADDR).parse()?;

    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(filestat_client::send_file(addr, Path::new(&file)))?;

    println!("{}", report.summary());
    Ok(())
}
