// Fetch one transaction and show how the swap detector classifies it.
//
// Usage: detect_swap <signature>

use swap_indexer::blockchain::detector::{balance_changes, detect_swap};
use swap_indexer::config::Config;
use swap_indexer::traits::SignatureSource;
use swap_indexer::validation::validate_signature;
use swap_indexer::SolanaClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let signature = std::env::args()
        .nth(1)
        .ok_or("usage: detect_swap <signature>")?;
    validate_signature(&signature)?;

    let config = Config::from_env();
    let client = SolanaClient::new(&config);

    println!("Fetching {} from {}", signature, config.solana_rpc_url);
    let tx = client.get_parsed_transaction(&signature).await?;

    let changes = balance_changes(&tx)?;
    println!("Signer: {}", changes.signer);
    println!("Signer changes by token:");
    for (mint, change) in &changes.signer_changes {
        println!("  {} {:+}", mint, change);
    }
    println!("Counterparty changes by token:");
    for (mint, change) in &changes.counterparty_changes {
        println!("  {} {:+}", mint, change);
    }

    match detect_swap(&signature, &tx)? {
        Some(swap) => {
            println!("✅ Swap detected");
            println!("{}", serde_json::to_string_pretty(&swap)?);
        }
        None => println!("❌ Not a two-sided swap"),
    }

    Ok(())
}
