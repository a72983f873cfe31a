//! Concurrent callers against one table.

use std::sync::Arc;
use vpoker::{
    TableConfig, TableError, TableManager,
    registry::{TableRegistry, UserRegistry},
    table::Side,
};

fn manager() -> Arc<TableManager> {
    Arc::new(TableManager::new(
        Arc::new(UserRegistry::new()),
        Arc::new(TableRegistry::new()),
        TableConfig::default(),
    ))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_respect_capacity() {
    let manager = manager();
    let host = manager.register_user("host").await;
    let table_id = manager.create_table(&host).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..20 {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move {
            let user = manager.register_user(&format!("guest{i}")).await;
            manager.join_table(table_id, &user).await
        }));
    }

    let mut seated = 0;
    let mut full = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(Some(_)) => seated += 1,
            Err(TableError::TableFull { max_seats }) => {
                assert_eq!(max_seats, 3);
                full += 1;
            }
            other => panic!("unexpected join result: {other:?}"),
        }
    }

    assert_eq!(seated, 2);
    assert_eq!(full, 18);
    let players = manager.seated_players(table_id, &host).await.unwrap();
    let seats: Vec<usize> = players.iter().map(|p| p.index).collect();
    assert_eq!(seats, vec![0, 1, 2]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_takes_have_one_winner() {
    let manager = manager();
    let alice = manager.register_user("alice").await;
    let bob = manager.register_user("bob").await;
    let table_id = manager.create_table(&alice).await.unwrap();
    manager.join_table(table_id, &bob).await.unwrap();

    for item_id in 1..=20 {
        let a = {
            let (manager, alice) = (manager.clone(), alice.clone());
            tokio::spawn(async move { manager.take_item(table_id, item_id, &alice).await })
        };
        let b = {
            let (manager, bob) = (manager.clone(), bob.clone());
            tokio::spawn(async move { manager.take_item(table_id, item_id, &bob).await })
        };
        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        // Exactly one take can succeed; the loser sees the winner's claim.
        assert!(a.is_ok() != b.is_ok(), "item {item_id}: {a:?} / {b:?}");
        let loser = if a.is_ok() { b } else { a };
        assert!(matches!(loser, Err(TableError::NotOwner(id)) if id == item_id));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_independent_tables_make_progress_together() {
    let manager = manager();
    let mut handles = Vec::new();
    for i in 0..8 {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move {
            let user = manager.register_user(&format!("host{i}")).await;
            let table_id = manager.create_table(&user).await.unwrap();
            for item_id in 1..=52 {
                manager.take_item(table_id, item_id, &user).await.unwrap();
                manager.show_item(table_id, item_id, &user).await.unwrap();
            }
            let state = manager.table_state(table_id, &user).await.unwrap();
            state
                .items
                .iter()
                .filter(|i| i.side() == Some(Side::Face))
                .count()
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), 52);
    }
    assert_eq!(manager.table_count().await, 8);
}
