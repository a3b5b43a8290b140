//! Placement behavior: balance debits, validation, and per-user serialization.

use rust_decimal::Decimal;
use wager_ledger::{
    LedgerConfig, LedgerError, MemoryStore, PlaceWagerRequest, QueryService, Store,
    TransactionCoordinator, WagerStatus,
};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn store_with_user(user_id: &str, balance: &str) -> MemoryStore {
    let store = MemoryStore::new(LedgerConfig::default());
    store.seed_user(user_id, dec(balance));
    store
}

fn request(user_id: &str, stake: &str, odds: &str) -> PlaceWagerRequest {
    PlaceWagerRequest {
        user_id: user_id.to_string(),
        sport: "football".to_string(),
        event_id: "fixture-100".to_string(),
        market: None,
        selection: "home".to_string(),
        odds: dec(odds),
        stake: dec(stake),
        extra_event_info: None,
        idempotency_key: None,
    }
}

#[tokio::test]
async fn successful_placement_debits_balance_and_fixes_payout() {
    let store = store_with_user("u1", "100");
    let coordinator = TransactionCoordinator::new(store.clone());

    let receipt = coordinator.place_wager(&request("u1", "40", "2.5")).await.unwrap();

    assert_eq!(receipt.new_balance, dec("60"));
    assert_eq!(receipt.potential_win, dec("100"));
    assert_eq!(store.get_balance("u1").await.unwrap(), Some(dec("60")));

    let wager = store.get_wager(receipt.bet_id).await.unwrap().unwrap();
    assert_eq!(wager.status, WagerStatus::Pending);
    assert_eq!(wager.potential_win, wager.stake * wager.odds);
    assert_eq!(wager.market, "winner");
}

#[tokio::test]
async fn insufficient_funds_leaves_balance_untouched() {
    let store = store_with_user("u1", "50");
    let coordinator = TransactionCoordinator::new(store.clone());

    let err = coordinator.place_wager(&request("u1", "60", "2")).await.unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds { .. }));

    assert_eq!(store.get_balance("u1").await.unwrap(), Some(dec("50")));
    let bets = QueryService::new(store).list_wagers("u1", None).await.unwrap();
    assert!(bets.is_empty());
}

#[tokio::test]
async fn unknown_user_fails_without_creating_a_wager() {
    let store = MemoryStore::new(LedgerConfig::default());
    let coordinator = TransactionCoordinator::new(store.clone());

    let err = coordinator.place_wager(&request("ghost", "10", "2")).await.unwrap_err();
    assert!(matches!(err, LedgerError::UserNotFound { .. }));

    let bets = QueryService::new(store).list_wagers("ghost", None).await.unwrap();
    assert!(bets.is_empty());
}

#[tokio::test]
async fn invalid_stake_is_rejected_before_any_store_access() {
    let store = store_with_user("u1", "100");
    let coordinator = TransactionCoordinator::new(store.clone());

    let err = coordinator.place_wager(&request("u1", "-5", "2")).await.unwrap_err();
    assert!(matches!(err, LedgerError::Validation { field: "stake" }));

    assert_eq!(store.get_balance("u1").await.unwrap(), Some(dec("100")));
    let bets = QueryService::new(store).list_wagers("u1", None).await.unwrap();
    assert!(bets.is_empty());
}

#[tokio::test]
async fn odds_at_or_below_one_are_rejected() {
    let store = store_with_user("u1", "100");
    let coordinator = TransactionCoordinator::new(store.clone());

    let err = coordinator.place_wager(&request("u1", "10", "1")).await.unwrap_err();
    assert!(matches!(err, LedgerError::Validation { field: "odds" }));
}

#[tokio::test]
async fn concurrent_placements_never_overdraw_a_balance() {
    // Balance 100, two concurrent stakes of 60: exactly one may succeed,
    // whichever order the tasks land in. Repeat to shake out orderings.
    for _ in 0..20 {
        let store = store_with_user("u1", "100");
        let coordinator = TransactionCoordinator::new(store.clone());

        let mut handles = Vec::new();
        for _ in 0..2 {
            let coordinator = coordinator.clone();
            handles.push(tokio::spawn(async move {
                coordinator.place_wager(&request("u1", "60", "1.5")).await
            }));
        }

        let mut successes = 0;
        let mut insufficient = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(receipt) => {
                    successes += 1;
                    assert_eq!(receipt.new_balance, dec("40"));
                }
                Err(LedgerError::InsufficientFunds { .. }) => insufficient += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(insufficient, 1);
        assert_eq!(store.get_balance("u1").await.unwrap(), Some(dec("40")));

        let bets = QueryService::new(store).list_wagers("u1", None).await.unwrap();
        assert_eq!(bets.len(), 1);
    }
}

#[tokio::test]
async fn placements_for_different_users_proceed_independently() {
    let store = MemoryStore::new(LedgerConfig::default());
    store.seed_user("a", dec("100"));
    store.seed_user("b", dec("100"));
    let coordinator = TransactionCoordinator::new(store.clone());

    let mut handles = Vec::new();
    for user in ["a", "b"] {
        let coordinator = coordinator.clone();
        handles.push(tokio::spawn(async move {
            coordinator.place_wager(&request(user, "30", "2")).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.get_balance("a").await.unwrap(), Some(dec("70")));
    assert_eq!(store.get_balance("b").await.unwrap(), Some(dec("70")));
}

#[tokio::test]
async fn replayed_idempotency_key_does_not_double_spend() {
    let store = store_with_user("u1", "100");
    let coordinator = TransactionCoordinator::new(store.clone());

    let mut req = request("u1", "40", "2.5");
    req.idempotency_key = Some("client-retry-1".to_string());

    let first = coordinator.place_wager(&req).await.unwrap();
    let replay = coordinator.place_wager(&req).await.unwrap();

    assert_eq!(replay.bet_id, first.bet_id);
    assert_eq!(replay.potential_win, first.potential_win);
    assert_eq!(store.get_balance("u1").await.unwrap(), Some(dec("60")));

    let bets = QueryService::new(store).list_wagers("u1", None).await.unwrap();
    assert_eq!(bets.len(), 1);
}
