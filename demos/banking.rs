//! # uow-es Example: Banking
//!
//! ## Usage
//!
//! ```sh
//! cargo run --example banking
//! ```

use std::sync::Arc;

use tokio::sync::Mutex;

#[path = "../tests/common/mod.rs"]
mod common;
use common::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let store = BankingStore::new();

    // First session: open an account and persist its first two changes.
    let mut session = unit_of_work(store.clone());

    let account = Arc::new(Mutex::new(Account::open("acc-42", 25)));
    account.lock().await.increase_balance(6006, 100);

    session.track(&account_contract(), "acc-42".to_string(), Arc::clone(&account))?;
    session.commit().await?;

    {
        let guard = account.lock().await;
        assert_eq!(guard.balance(), 125);
        assert!(guard.changes().is_empty());
        println!(
            "committed {} events, balance is {}",
            guard.committed_events().len(),
            guard.balance()
        );
    }

    // Same session, one more change: the stream is opened, not re-created.
    account.lock().await.decrease_balance(6007, 50);
    session.commit().await?;

    // Second session: reload the account from its stored history.
    let mut reader = unit_of_work(store.clone());
    let reloaded = reader
        .get(&account_contract(), &"acc-42".to_string())
        .await?
        .expect("account was persisted");

    {
        let guard = reloaded.lock().await;
        assert_eq!(guard.balance(), 75);
        assert_eq!(guard.version(), 2);
        println!(
            "reloaded at version {} with balance {}",
            guard.version(),
            guard.balance()
        );
    }

    for record in store.journal().await {
        println!(
            "commit {} -> {} event(s) on `{}` (created: {})",
            record.commit_id, record.events, record.aggregate_id, record.created
        );
    }

    Ok(())
}
