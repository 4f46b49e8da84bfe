//! Gameplay actions against a live `World`, observed through each
//! player's outbound channel.

use std::time::Duration;

use lurk_protocol::{
    Character, CharacterFlags, ErrorCode, Message, MessageType, TextMessage,
};
use lurk_transport::ConnectionId;
use lurk_world::content::{
    self, BARRACKS, BATTLE_SCHOOL, COCOON, COLONEL_GRAPH, EARTH, EROS,
    HIVE_QUEEN, NARRATOR, SHAKESPEARE,
};
use lurk_world::{GameConfig, Monster, World, WorldError};
use tokio::sync::mpsc;
use tokio::time::Instant;

// =========================================================================
// Helpers
// =========================================================================

struct Client {
    rx: mpsc::UnboundedReceiver<Message>,
}

impl Client {
    fn drain(&mut self) -> Vec<Message> {
        let mut out = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            out.push(msg);
        }
        out
    }
}

fn character(name: &str, attack: u16, defense: u16, regen: u16) -> Character {
    Character {
        name: name.into(),
        attack,
        defense,
        regen,
        description: "A student".into(),
        ..Character::default()
    }
}

/// Registers and enters a player, discarding the frames that produces.
fn join(world: &mut World, c: Character) -> Client {
    let (tx, rx) = mpsc::unbounded_channel();
    let name = c.name.clone();
    world
        .register(c, ConnectionId::new(1), tx)
        .expect("registration should succeed")
        .dispatch();
    world.enter(&name).expect("player exists").dispatch();
    let mut client = Client { rx };
    client.drain();
    client
}

fn monster(name: &str, attack: u16, defense: u16, health: i16, room: u16, reward: u16) -> Monster {
    Monster::new(
        Character {
            name: name.into(),
            flags: CharacterFlags::default()
                .with(CharacterFlags::ALIVE, true)
                .with(CharacterFlags::MONSTER, true),
            attack,
            defense,
            health,
            room,
            ..Character::default()
        },
        health,
        reward,
    )
}

fn world_with(config: GameConfig, monsters: Vec<Monster>) -> World {
    World::with_content(config, content::world_map(), monsters.into_iter().collect())
}

fn narrations(msgs: &[Message]) -> Vec<&str> {
    msgs.iter()
        .filter_map(|m| match m {
            Message::Message(t) if t.narration => Some(t.text.as_str()),
            _ => None,
        })
        .collect()
}

fn characters(msgs: &[Message]) -> Vec<&Character> {
    msgs.iter()
        .filter_map(|m| match m {
            Message::Character(c) => Some(c),
            _ => None,
        })
        .collect()
}

fn connections(msgs: &[Message]) -> Vec<u16> {
    msgs.iter()
        .filter_map(|m| match m {
            Message::Connection(c) => Some(c.number),
            _ => None,
        })
        .collect()
}

// =========================================================================
// Registration and entry
// =========================================================================

#[test]
fn test_register_overrides_placement_and_status() {
    let mut world = World::new(GameConfig::default());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut submitted = character("Ender", 40, 30, 30);
    submitted.room = 14;
    submitted.gold = 999;
    submitted.health = 5;
    submitted.flags = CharacterFlags::from_bits(CharacterFlags::MONSTER);

    world.register(submitted, ConnectionId::new(1), tx).unwrap().dispatch();

    let Ok(Message::Character(echo)) = rx.try_recv() else {
        panic!("expected the character echo first");
    };
    assert_eq!(echo.room, BATTLE_SCHOOL);
    assert_eq!(echo.gold, 0);
    assert_eq!(echo.health, 100);
    assert!(echo.is_alive());
    assert!(!echo.is_monster());
    assert!(echo.flags.contains(CharacterFlags::READY));
    assert!(echo.flags.contains(CharacterFlags::STARTED));
    assert_eq!(
        rx.try_recv().ok(),
        Some(Message::accept(MessageType::Character))
    );
}

#[test]
fn test_register_rejects_over_budget_and_duplicates() {
    let mut world = World::new(GameConfig::default());
    let (tx, _rx) = mpsc::unbounded_channel();

    let err = world
        .register(character("Ender", 50, 50, 1), ConnectionId::new(1), tx.clone())
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::StatError);

    world
        .register(character("Ender", 50, 50, 0), ConnectionId::new(1), tx.clone())
        .unwrap();
    let err = world
        .register(character("Ender", 1, 1, 1), ConnectionId::new(2), tx)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::PlayerAlreadyExists);
    assert_eq!(world.players().len(), 1);
}

#[test]
fn test_register_rejects_narrator_and_monster_names() {
    let mut world = World::new(GameConfig::default());
    let (tx, _rx) = mpsc::unbounded_channel();

    for name in [NARRATOR, COCOON, COLONEL_GRAPH] {
        let err = world
            .register(character(name, 10, 10, 10), ConnectionId::new(1), tx.clone())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::PlayerAlreadyExists, "{name}");
    }
    assert!(world.players().is_empty());
}

#[test]
fn test_enter_sends_room_view_and_announces_arrival() {
    let mut world = World::new(GameConfig::default());
    let mut alai = join(&mut world, character("Alai", 10, 10, 10));

    let (tx, mut rx) = mpsc::unbounded_channel();
    world
        .register(character("Shen", 10, 10, 10), ConnectionId::new(2), tx)
        .unwrap()
        .dispatch();
    world.enter("Shen").unwrap().dispatch();

    let shen: Vec<Message> = std::iter::from_fn(|| rx.try_recv().ok()).skip(2).collect();
    let Message::Room(room) = &shen[0] else {
        panic!("room view starts with the room");
    };
    assert_eq!(room.number, BATTLE_SCHOOL);
    let names: Vec<&str> = characters(&shen).iter().map(|c| c.name.as_str()).collect();
    assert!(names.contains(&"Alai"));
    assert!(names.contains(&"Shen"));
    assert!(names.contains(&COLONEL_GRAPH));
    // Eros and Earth stay hidden until unlocked.
    assert_eq!(connections(&shen), vec![2, 3, 4]);

    let seen = alai.drain();
    assert_eq!(characters(&seen)[0].name, "Shen");
    assert_eq!(narrations(&seen), vec!["Shen joined battle school!"]);
}

// =========================================================================
// Movement
// =========================================================================

#[test]
fn test_change_room_moves_and_notifies_both_rooms() {
    let mut world = World::new(GameConfig::default());
    let mut mover = join(&mut world, character("Dink", 10, 10, 10));
    let mut stay = join(&mut world, character("Crazy Tom", 10, 10, 10));
    mover.drain();

    world.change_room("Dink", BARRACKS).unwrap().dispatch();

    assert_eq!(world.player("Dink").unwrap().room(), BARRACKS);
    let view = mover.drain();
    assert!(matches!(&view[0], Message::Room(r) if r.number == BARRACKS));
    assert_eq!(connections(&view), vec![BATTLE_SCHOOL]);

    let seen = stay.drain();
    assert_eq!(characters(&seen)[0].room, BARRACKS);
}

#[test]
fn test_change_room_rejects_unconnected_and_locked_rooms() {
    let mut world = World::new(GameConfig::default());
    let _c = join(&mut world, character("Dink", 10, 10, 10));

    for to in [6, EROS, 99] {
        let err = world.change_room("Dink", to).unwrap_err();
        assert_eq!(err.code(), ErrorCode::BadRoom, "room {to}");
    }
    assert_eq!(world.player("Dink").unwrap().room(), BATTLE_SCHOOL);
}

#[test]
fn test_debug_player_sees_secret_rooms() {
    let mut world = World::new(GameConfig::default());
    let _c = join(&mut world, character("Beans Shumaker", 10, 10, 10));
    world.change_room("Beans Shumaker", EROS).unwrap();
    world.change_room("Beans Shumaker", SHAKESPEARE).unwrap();
    assert_eq!(world.player("Beans Shumaker").unwrap().room(), SHAKESPEARE);
}

#[test]
fn test_barracks_revives_dead_player() {
    let brute = monster("Brute", 1000, 0, 100, BATTLE_SCHOOL, 0);
    let mut world = world_with(GameConfig::default(), vec![brute]);
    let _c = join(&mut world, character("Ender", 10, 0, 0));

    world.fight("Ender", Instant::now()).unwrap();
    assert!(!world.player("Ender").unwrap().character.is_alive());

    world.change_room("Ender", BARRACKS).unwrap();
    let ender = &world.player("Ender").unwrap().character;
    assert!(ender.is_alive());
    assert_eq!(ender.health, 100);
}

// =========================================================================
// Fight
// =========================================================================

#[test]
fn test_fight_kills_monster_and_awards_gold() {
    let mut world = World::new(GameConfig::default());
    let mut ender = join(&mut world, character("Ender", 100, 0, 0));

    let outcome = world.fight("Ender", Instant::now()).unwrap();
    assert_eq!(outcome.engaged, vec![COLONEL_GRAPH]);
    assert_eq!(outcome.killed, vec![COLONEL_GRAPH]);
    outcome.outbox.dispatch();

    let player = &world.player("Ender").unwrap().character;
    assert_eq!(player.health, 80);
    assert_eq!(player.gold, 10);
    assert!(!world.monsters().get(COLONEL_GRAPH).unwrap().character.is_alive());

    let seen = ender.drain();
    assert_eq!(characters(&seen).len(), 2);
    assert!(narrations(&seen).is_empty());
}

#[test]
fn test_fight_with_no_live_monsters() {
    let mut world = World::new(GameConfig::default());
    let _c = join(&mut world, character("Ender", 10, 10, 10));
    world.change_room("Ender", BARRACKS).unwrap();

    let err = world.fight("Ender", Instant::now()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoFight);
    assert!(err.to_string().contains("The Barracks"));
}

#[test]
fn test_fight_death_stops_sweep_and_withholds_gold() {
    let brute = monster("Brute", 1000, 0, 100, BATTLE_SCHOOL, 0);
    let weak = monster("Weakling", 0, 0, 1, BATTLE_SCHOOL, 500);
    let mut world = world_with(GameConfig::default(), vec![brute, weak]);
    let mut ender = join(&mut world, character("Ender", 10, 0, 0));

    let outcome = world.fight("Ender", Instant::now()).unwrap();
    // Roster order is by name: Brute first, and the sweep ends there.
    assert_eq!(outcome.engaged, vec!["Brute"]);
    outcome.outbox.dispatch();

    assert_eq!(world.player("Ender").unwrap().character.gold, 0);
    assert!(world.monsters().get("Weakling").unwrap().character.is_alive());
    let seen = ender.drain();
    assert_eq!(
        narrations(&seen),
        vec!["You have lost in battle. Regenerate your health to fight again."]
    );

    let err = world.fight("Ender", Instant::now()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoFight);
}

#[test]
fn test_fight_skips_cocoon() {
    let mut world = World::new(GameConfig::default());
    let _c = join(&mut world, character("Beans Shumaker", 50, 50, 0));
    world.change_room("Beans Shumaker", EROS).unwrap();
    world.change_room("Beans Shumaker", SHAKESPEARE).unwrap();

    let err = world.fight("Beans Shumaker", Instant::now()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::Other);
    assert!(world.monsters().get(COCOON).unwrap().character.is_alive());
}

// =========================================================================
// PvP
// =========================================================================

#[test]
fn test_pvp_fight_between_players() {
    let mut world = World::new(GameConfig::default());
    let mut bean = join(&mut world, character("Dink", 60, 20, 20));
    let mut bonzo = join(&mut world, character("Bonzo", 30, 30, 40));
    bean.drain();

    let outcome = world.pvp_fight("Dink", "Bonzo", Instant::now()).unwrap();
    assert!(outcome.engaged.is_empty());
    outcome.outbox.dispatch();

    let seen = bonzo.drain();
    assert_eq!(
        narrations(&seen)[0],
        "You have been engaged in combat by Dink!"
    );
    // Dink deals 60 - 60 * 30/200 = 51, takes 30 - 30 * 20/200 = 27.
    assert_eq!(world.player("Bonzo").unwrap().character.health, 100 - 51 + 51 * 40 / 500);
    assert_eq!(world.player("Dink").unwrap().character.health, 100 - 27 + 27 * 20 / 500);
    assert!(!characters(&bean.drain()).is_empty());
}

#[test]
fn test_pvp_fight_rejections() {
    let mut world = World::new(GameConfig::default());
    let _a = join(&mut world, character("Alai", 10, 10, 10));
    let _b = join(&mut world, character("Vlad", 10, 10, 10));
    let now = Instant::now();

    let err = world.pvp_fight("Alai", "Alai", now).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoPvp);
    let err = world.pvp_fight("Alai", "Nobody", now).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoTarget);
    let err = world.pvp_fight("Alai", COLONEL_GRAPH, now).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoPvp);
    let err = world.pvp_fight("Alai", COCOON, now).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoFight);

    world.change_room("Vlad", BARRACKS).unwrap();
    let err = world.pvp_fight("Alai", "Vlad", now).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoFight);
}

#[test]
fn test_pvp_fight_destroys_cocoon() {
    let mut world = World::new(GameConfig::default());
    let mut beans = join(&mut world, character("Beans Shumaker", 50, 50, 0));
    world.change_room("Beans Shumaker", EROS).unwrap();
    world.change_room("Beans Shumaker", SHAKESPEARE).unwrap();
    beans.drain();

    let outcome = world.pvp_fight("Beans Shumaker", COCOON, Instant::now()).unwrap();
    assert_eq!(outcome.engaged, vec![COCOON]);
    assert_eq!(outcome.killed, vec![COCOON]);
    outcome.outbox.dispatch();

    assert_eq!(
        narrations(&beans.drain()),
        vec!["You have committed true Xenocide."]
    );
    let err = world
        .pvp_fight("Beans Shumaker", COCOON, Instant::now())
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoFight);
}

// =========================================================================
// Messages and upgrades
// =========================================================================

#[test]
fn test_message_relays_with_real_sender() {
    let mut world = World::new(GameConfig::default());
    let _a = join(&mut world, character("Alai", 10, 10, 10));
    let mut petra = join(&mut world, character("Petra", 10, 10, 10));

    let forged = TextMessage {
        recipient: "Petra".into(),
        sender: "Graff".into(),
        narration: true,
        text: "Salaam".into(),
    };
    world.message("Alai", forged).unwrap().dispatch();

    let seen = petra.drain();
    let [Message::Message(relayed)] = seen.as_slice() else {
        panic!("expected one relayed message, got {seen:?}");
    };
    assert_eq!(relayed.sender, "Alai");
    assert!(!relayed.narration);
    assert_eq!(relayed.text, "Salaam");

    let err = world
        .message("Alai", TextMessage::narration("Nobody", "Alai", "hi"))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoTarget);
}

fn rich_world(config: GameConfig, reward: u16) -> World {
    let piggy = monster("Piggy Bank", 0, 0, 1, BATTLE_SCHOOL, reward);
    world_with(config, vec![piggy])
}

#[test]
fn test_upgrade_in_barracks() {
    let mut world = rich_world(GameConfig::default(), 60);
    let mut ender = join(&mut world, character("Ender", 30, 30, 30));
    let mut other = join(&mut world, character("Alai", 10, 10, 10));
    world.fight("Ender", Instant::now()).unwrap();

    let to_narrator = TextMessage::narration(NARRATOR, "Ender", "upgrade");
    let err = world.message("Ender", to_narrator.clone()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::StatError);

    world.change_room("Ender", BARRACKS).unwrap();
    ender.drain();
    other.drain();
    world.message("Ender", to_narrator).unwrap().dispatch();

    let c = &world.player("Ender").unwrap().character;
    assert_eq!((c.attack, c.defense, c.regen, c.gold), (35, 35, 35, 10));
    assert_eq!(characters(&other.drain())[0].attack, 35);
    assert_eq!(characters(&ender.drain())[0].attack, 35);
}

#[test]
fn test_upgrade_respects_stat_limit() {
    let config = GameConfig {
        stat_limit: 110,
        ..GameConfig::default()
    };
    let mut world = rich_world(config, 60);
    let _c = join(&mut world, character("Ender", 40, 30, 30));
    world.fight("Ender", Instant::now()).unwrap();
    world.change_room("Ender", BARRACKS).unwrap();

    let err = world
        .message("Ender", TextMessage::narration(NARRATOR, "Ender", ""))
        .unwrap_err();
    assert!(matches!(err, WorldError::StatError(ref m) if m.contains("100")));
    assert_eq!(world.player("Ender").unwrap().character.gold, 60);
}

// =========================================================================
// Status refresh
// =========================================================================

#[test]
fn test_refresh_prompts_upgrade_in_barracks() {
    let mut world = rich_world(GameConfig::default(), 60);
    let mut ender = join(&mut world, character("Ender", 10, 10, 10));
    world.fight("Ender", Instant::now()).unwrap();
    assert!(world.refresh_status("Ender").is_empty());

    world.change_room("Ender", BARRACKS).unwrap();
    ender.drain();
    world.refresh_status("Ender").dispatch();
    let seen = ender.drain();
    assert!(narrations(&seen)[0].starts_with("Looks like some of your hard work"));
}

#[test]
fn test_refresh_unlocks_eros_once() {
    let mut world = rich_world(GameConfig::default(), 150);
    let mut ender = join(&mut world, character("Ender", 10, 10, 10));
    world.fight("Ender", Instant::now()).unwrap().outbox.dispatch();
    ender.drain();

    world.refresh_status("Ender").dispatch();
    assert_eq!(connections(&ender.drain()), vec![2, 3, 4, EROS]);
    assert!(world.refresh_status("Ender").is_empty());
    assert!(world.change_room("Ender", EROS).is_ok());
}

#[test]
fn test_killing_hive_queen_unlocks_earth_and_shakespeare() {
    let queen = monster(HIVE_QUEEN, 0, 0, 1, BATTLE_SCHOOL, 0);
    let mut world = world_with(GameConfig::default(), vec![queen]);
    let mut ender = join(&mut world, character("Ender", 10, 10, 10));
    world.fight("Ender", Instant::now()).unwrap();
    assert!(world.player("Ender").unwrap().killed_queen);

    world.refresh_status("Ender").dispatch();
    assert_eq!(connections(&ender.drain()), vec![2, 3, 4, EARTH]);
    let player = world.player("Ender").unwrap();
    assert!(player.may_enter(SHAKESPEARE));
    assert!(!player.may_enter(EROS));
}

// =========================================================================
// Leave
// =========================================================================

#[test]
fn test_leave_notifies_room() {
    let mut world = World::new(GameConfig::default());
    let _a = join(&mut world, character("Alai", 10, 10, 10));
    let mut shen = join(&mut world, character("Shen", 10, 10, 10));

    world.leave("Alai").dispatch();

    let seen = shen.drain();
    let gone = characters(&seen)[0];
    assert_eq!((gone.name.as_str(), gone.room), ("Alai", 0));
    assert_eq!(narrations(&seen), vec!["Alai left the server!"]);
    assert!(world.player("Alai").is_none());
    assert!(world.leave("Alai").is_empty());
}

// =========================================================================
// Heal
// =========================================================================

#[test]
fn test_heal_waits_for_idle_period() {
    let mut world = World::new(GameConfig::default());
    let mut ender = join(&mut world, character("Ender", 10, 0, 0));
    let engaged_at = Instant::now();

    world.fight("Ender", engaged_at).unwrap();
    // 10 - 10 * 100/200 = 5 damage, then 5 * 100/500 = 1 regen.
    assert_eq!(world.monsters().get(COLONEL_GRAPH).unwrap().character.health, 46);
    ender.drain();

    assert!(world.heal(COLONEL_GRAPH, engaged_at + Duration::from_secs(9)).is_empty());
    assert_eq!(world.monsters().get(COLONEL_GRAPH).unwrap().character.health, 46);

    world
        .heal(COLONEL_GRAPH, engaged_at + Duration::from_secs(10))
        .dispatch();
    assert_eq!(world.monsters().get(COLONEL_GRAPH).unwrap().character.health, 50);
    let seen = ender.drain();
    assert_eq!(characters(&seen)[0].name, COLONEL_GRAPH);
}

#[test]
fn test_heal_revives_dead_monster() {
    let mut world = World::new(GameConfig::default());
    let _c = join(&mut world, character("Ender", 100, 0, 0));
    let at = Instant::now();
    world.fight("Ender", at).unwrap();

    world.heal(COLONEL_GRAPH, at + Duration::from_secs(10));
    let colonel = &world.monsters().get(COLONEL_GRAPH).unwrap().character;
    assert!(colonel.is_alive());
    assert_eq!(colonel.health, 50);
}
