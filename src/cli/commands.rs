use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "ember-chain")]
pub struct Opt {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(
        name = "demo",
        about = "Run an end-to-end walkthrough: wallets, pool, mining, peer replacement"
    )]
    Demo {
        #[arg(long, default_value_t = 50, help = "Amount the demo sender transfers")]
        amount: u64,
    },
    #[command(
        name = "average-work",
        about = "Mine a run of blocks and report mine times and difficulty"
    )]
    AverageWork {
        #[arg(long, default_value_t = 10, help = "Number of blocks to mine")]
        blocks: usize,
    },
}
