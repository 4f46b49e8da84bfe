//! Heal timers and action dispatch against the shared game, with paused
//! time so that timer behavior is deterministic.

use std::sync::Arc;
use std::time::Duration;

use lurk::prelude::*;
use lurk_transport::ConnectionId;
use tokio::sync::mpsc;

const COLONEL: &str = "Colonel Graph";

// =========================================================================
// Helpers
// =========================================================================

async fn join(
    game: &Game,
    name: &str,
    stats: (u16, u16, u16),
) -> mpsc::UnboundedReceiver<Message> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let character = Character {
        name: name.into(),
        attack: stats.0,
        defense: stats.1,
        regen: stats.2,
        ..Character::default()
    };
    game.register(character, ConnectionId::new(1), tx)
        .await
        .expect("registration should succeed");
    game.enter(name).await.expect("player exists");
    while rx.try_recv().is_ok() {}
    rx
}

async fn colonel_health(game: &Game) -> i16 {
    game.lock()
        .await
        .world
        .monsters()
        .get(COLONEL)
        .expect("colonel exists")
        .character
        .health
}

// =========================================================================
// Heal timers
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_killed_monster_heals_after_idle_period() {
    let game = Game::new(GameConfig::default());
    let mut rx = join(&game, "Ender", (100, 0, 0)).await;

    game.act("Ender", Message::Fight).await.unwrap();
    assert!(colonel_health(&game).await <= 0);
    assert!(game.lock().await.heal_timers.is_pending(&COLONEL.to_string()));
    while rx.try_recv().is_ok() {}

    tokio::time::sleep(Duration::from_secs(9)).await;
    assert!(colonel_health(&game).await <= 0);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(colonel_health(&game).await, 50);
    match rx.try_recv() {
        Ok(Message::Character(c)) => {
            assert_eq!(c.name, COLONEL);
            assert!(c.is_alive());
        }
        other => panic!("expected the healed colonel, got {other:?}"),
    }
    assert!(!game.lock().await.heal_timers.is_pending(&COLONEL.to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_reengaging_pushes_heal_back() {
    let game = Game::new(GameConfig::default());
    let _rx = join(&game, "Ender", (10, 0, 0)).await;

    game.act("Ender", Message::Fight).await.unwrap();
    let after_first = colonel_health(&game).await;
    assert!(after_first < 50);

    tokio::time::sleep(Duration::from_secs(6)).await;
    game.act("Ender", Message::Fight).await.unwrap();
    let after_second = colonel_health(&game).await;

    // Ten seconds after the first fight, but only four after the second.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(colonel_health(&game).await, after_second);

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(colonel_health(&game).await, 50);
    assert_eq!(game.lock().await.heal_timers.armed_total(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_heal_notifies_only_that_room() {
    let game = Game::new(GameConfig::default());
    let _fighter = join(&game, "Ender", (100, 0, 0)).await;
    let mut elsewhere = join(&game, "Petra", (10, 10, 10)).await;
    game.act("Petra", Message::ChangeRoom { room: 2 }).await.unwrap();

    game.act("Ender", Message::Fight).await.unwrap();
    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(colonel_health(&game).await, 50);

    let mut saw_colonel = false;
    while let Ok(msg) = elsewhere.try_recv() {
        if matches!(&msg, Message::Character(c) if c.name == COLONEL) {
            saw_colonel = true;
        }
    }
    assert!(!saw_colonel);
}

#[tokio::test(start_paused = true)]
async fn test_heal_and_fight_reach_room_in_world_order() {
    let game = Arc::new(Game::new(GameConfig::default()));
    let mut rx = join(&game, "Ender", (100, 0, 0)).await;
    game.act("Ender", Message::Fight).await.unwrap();
    while rx.try_recv().is_ok() {}

    // Hold the world while the heal comes due, then queue a fight behind it.
    let world = game.lock().await;
    tokio::time::sleep(Duration::from_secs(11)).await;
    let fight = tokio::spawn({
        let game = Arc::clone(&game);
        async move { game.act("Ender", Message::Fight).await }
    });
    tokio::task::yield_now().await;
    drop(world);
    fight.await.unwrap().unwrap();
    assert!(colonel_health(&game).await <= 0);

    let mut colonel = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        if let Message::Character(c) = msg {
            if c.name == COLONEL {
                colonel.push(c.is_alive());
            }
        }
    }
    assert_eq!(colonel.first(), Some(&true), "heal first: {colonel:?}");
    assert_eq!(colonel.last(), Some(&false), "fight last: {colonel:?}");
}

// =========================================================================
// Dispatch
// =========================================================================

#[tokio::test]
async fn test_non_action_frames_are_refused() {
    let game = Game::new(GameConfig::default());
    let _rx = join(&game, "Ender", (10, 10, 10)).await;

    let err = game.act("Ender", Message::Start).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::Other);
}

#[tokio::test]
async fn test_loot_is_accepted_and_ignored() {
    let game = Game::new(GameConfig::default());
    let mut rx = join(&game, "Ender", (10, 10, 10)).await;

    game.act("Ender", Message::Loot { target: COLONEL.into() })
        .await
        .unwrap();
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_leave_is_idempotent() {
    let game = Game::new(GameConfig::default());
    let _rx = join(&game, "Ender", (10, 10, 10)).await;

    game.leave("Ender").await;
    game.leave("Ender").await;
    assert!(game.lock().await.world.players().is_empty());
}
