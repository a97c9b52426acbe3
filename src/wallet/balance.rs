use crate::config::STARTING_BALANCE;
use crate::core::{Block, BlockData};

/// Spendable balance of `address`, derived by scanning the chain from the
/// tip backwards.
///
/// Each block's outputs credited to `address` are accumulated. The scan
/// stops descending at the most recent block in which `address` authored a
/// transaction: that transaction's own change output already records the
/// sender's full remaining balance, so older history is irrelevant. If no
/// self-authored transaction exists anywhere, the fixed starting balance
/// is added to the accumulated credits.
///
/// This is a checkpoint scan over self-authored change outputs, not a UTXO
/// index; it trusts that every transaction the wallet signed carries a
/// correct change entry.
pub fn calculate_balance(chain: &[Block], address: &str) -> u64 {
    let mut has_conducted_transaction = false;
    let mut outputs_total: u64 = 0;

    for block in chain.iter().skip(1).rev() {
        if let BlockData::Transactions(transactions) = block.get_data() {
            for transaction in transactions {
                if transaction.get_input().get_address() == address {
                    has_conducted_transaction = true;
                }
                if let Some(output) = transaction.get_output_map().get(address) {
                    outputs_total = outputs_total.saturating_add(*output);
                }
            }
        }

        if has_conducted_transaction {
            break;
        }
    }

    if has_conducted_transaction {
        outputs_total
    } else {
        STARTING_BALANCE.saturating_add(outputs_total)
    }
}
