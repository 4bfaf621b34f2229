#![deny(unsafe_code)]
pub mod commands;
mod version;

use anyhow::Result;
use clap::Parser;
use clap::builder::styling::{AnsiColor, Effects, Styles};
use commands::command::Command;
use commands::fan_out::FanOut;
use commands::relay::Relay;
use commands::stress::Stress;
use enum_dispatch::enum_dispatch;
use env_logger::Env;
use log::info;

/// Custom styles for CLI help output
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser, Debug)]
#[command(styles = STYLES)]
struct Args {
    #[clap(subcommand)]
    subcommand: Subcommand,
}

#[enum_dispatch(Command)]
#[derive(Parser, Debug)]
#[command(version)]
enum Subcommand {
    // Queue checks
    #[command(display_order = 1)]
    Stress(Stress),
    #[command(display_order = 2)]
    FanOut(FanOut),

    // Pipelines
    #[command(display_order = 3)]
    Relay(Relay),
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    info!("Running seqpipe version {}", version::VERSION.as_str());
    args.subcommand.execute()
}
