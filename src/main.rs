use clap::Parser;
use ember_chain::{
    Block, BlockData, Blockchain, Broadcaster, Command, Miner, NullBroadcaster, Opt,
    TransactionPool, Wallet, GLOBAL_CONFIG,
};
use log::{error, info, LevelFilter};
use std::process;
use std::sync::Arc;

fn main() {
    env_logger::builder().filter_level(LevelFilter::Info).init();

    let opt = Opt::parse();

    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Demo { amount } => demo(amount),
        Command::AverageWork { blocks } => average_work(blocks),
    }
}

/// End-to-end walkthrough on an in-process node: submit a transfer, merge
/// a follow-up into it, mine, report balances, then accept a longer peer
/// chain.
fn demo(amount: u64) -> Result<(), Box<dyn std::error::Error>> {
    let node_id = GLOBAL_CONFIG.get_node_id();
    info!("Starting demo node {node_id}");

    let blockchain = Blockchain::new();
    let pool = Arc::new(TransactionPool::new());
    let miner_wallet = Arc::new(Wallet::new()?);
    let broadcaster = Arc::new(NullBroadcaster);
    let miner = Miner::new(
        blockchain.clone(),
        Arc::clone(&pool),
        Arc::clone(&miner_wallet),
        broadcaster.clone(),
    );

    let sender = Wallet::new()?;
    let recipient = Wallet::new()?;

    let transaction =
        sender.create_transaction(&recipient.address(), amount, Some(&blockchain.blocks()))?;
    broadcaster.broadcast_transaction(&transaction);
    pool.set(transaction);

    // A sender with a pending transaction merges further transfers into
    // it instead of submitting a second one.
    let follow_up = amount / 2;
    if follow_up > 0 {
        let mut pending = pool
            .existing_transaction(&sender.address())
            .ok_or("Pending transaction disappeared from the pool")?;
        match pending.update(&sender, &recipient.address(), follow_up) {
            Ok(()) => pool.set(pending),
            Err(e) => info!("Skipping follow-up transfer: {e}"),
        }
    }

    let block = miner.mine_transactions()?;
    info!("Settled block {}", block.get_hash());

    println!(
        "chain: {}",
        serde_json::to_string_pretty(&blockchain.blocks())?
    );
    println!("sender balance: {}", sender.balance(&blockchain.blocks()));
    println!(
        "recipient balance: {}",
        recipient.balance(&blockchain.blocks())
    );
    println!(
        "miner balance: {}",
        miner_wallet.balance(&blockchain.blocks())
    );

    // An incoming chain only wins if it is strictly longer and valid; on
    // acceptance the pool drops whatever the new chain settled.
    let peer = Blockchain::new();
    for i in 0..blockchain.len() {
        peer.add_block(BlockData::Raw(format!("peer block {i}")))?;
    }
    blockchain.replace_chain(
        peer.blocks(),
        true,
        Some(&|chain: &[Block]| pool.clear_mined(chain)),
    );
    println!("chain length after peer sync: {}", blockchain.len());

    Ok(())
}

/// Mine a run of blocks and report per-block mine time, the retargeted
/// difficulty, and the running average against the configured mine rate.
fn average_work(blocks: usize) -> Result<(), Box<dyn std::error::Error>> {
    let blockchain = Blockchain::new();
    blockchain.add_block(BlockData::Raw("initial data".to_string()))?;

    let mut times: Vec<i64> = Vec::new();

    for i in 0..blocks {
        let prev_timestamp = blockchain.last_block().get_timestamp();
        let block = blockchain.add_block(BlockData::Raw(format!("block {i}")))?;

        let time_diff = block.get_timestamp() - prev_timestamp;
        times.push(time_diff);
        let average = times.iter().sum::<i64>() as f64 / times.len() as f64;

        println!(
            "Time to mine block: {time_diff} ms. New difficulty: {}. Average mine time: {average:.1} ms.",
            block.get_difficulty()
        );
    }

    Ok(())
}
