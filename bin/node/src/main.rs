//! Basalt node binary.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod chain;
mod node;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    node::Cli::parse().run()
}
