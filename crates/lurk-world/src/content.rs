//! The Battle School campaign: every room, connection and monster.
//!
//! Content is plain data built once at startup. Rooms 1 through 6 are open
//! to everyone; 11 through 14 are secret until a player earns them.

use std::collections::{BTreeMap, HashMap};

use lurk_protocol::{Character, CharacterFlags, Connection, Room};

use crate::{Monster, MonsterRoster, RoomNode, WorldMap};

/// Sender name used for every narrated message.
pub const NARRATOR: &str = "Narrator";

pub const GAME_DESCRIPTION: &str = r#"
 ____  __ _  ____  ____  ____  _ ____     ___   __   _  _  ____
(  __)(  ( \(    \(  __)(  _ \(// ___)   / __) / _\ ( \/ )(  __)
 ) _) /    / ) D ( ) _)  )   /  \___ \  ( (_ \/    \/ \/ \ ) _)
(____)\_)__)(____/(____)(__\_)  (____/   \___/\_/\_/\_)(_/(____)

The world has been ravaged by the most feared and despised being known to man, the formic. When it comes down to preventing their second massacre, will you be the one to step up and destroy them?"#;

// ---------------------------------------------------------------------------
// Rooms
// ---------------------------------------------------------------------------

pub const BATTLE_SCHOOL: u16 = 1;
pub const BARRACKS: u16 = 2;
pub const GAME_ROOM: u16 = 3;
pub const BATTLE_ROOM: u16 = 4;
pub const FORMIC_STAR_SYSTEM: u16 = 5;
pub const ROTTERDAM: u16 = 6;
/// Unlocked by gold.
pub const EROS: u16 = 11;
/// Unlocked by killing the Hive Queen.
pub const SHAKESPEARE: u16 = 12;
/// Unlocked by killing the Hive Queen.
pub const EARTH: u16 = 13;
/// Unlocked by destroying the Formic Fleet.
pub const FORMIC_HOME_WORLD: u16 = 14;

/// Rooms every new player may enter.
pub const OPEN_ROOMS: std::ops::RangeInclusive<u16> = BATTLE_SCHOOL..=ROTTERDAM;

/// Rooms that start locked.
pub const SECRET_ROOMS: std::ops::RangeInclusive<u16> = EROS..=FORMIC_HOME_WORLD;

fn room(number: u16) -> Room {
    let (name, description) = match number {
        BATTLE_SCHOOL => (
            "Battle School",
            "A place where young children play a game. At least, that is what the media says. The reality is that they will manipulate and contort our lives just to see what we can handle.",
        ),
        BARRACKS => (
            "The Barracks",
            "The room filled with small children, most of them scared, but none of them trying to show their weakness.",
        ),
        GAME_ROOM => (
            "The Game Room",
            "Many older boys are hunched over the game table, just trying to show off to each other. You may be able to gain some experience if someone would give you the chance.",
        ),
        BATTLE_ROOM => (
            "The Battle Room",
            "A room, 100 cubic meters in size, defying the laws of gravity. With a gate on either side of the room, us children are able to wage war against each other for honor, all the while practicing zero G movement.",
        ),
        FORMIC_STAR_SYSTEM => (
            "Formic Star System",
            "Out here in the cold, dark vastness of space, a world filled with billions of alien life forms lay idle.",
        ),
        ROTTERDAM => (
            "Rotterdam, The Netherlands",
            "A city of ruins. The streets are filled with starved children fighting to the death.",
        ),
        EROS => (
            "Eros",
            "The secret base for International Fleet Command operations. The surface is blacked out, covered in solar panels. The inhabitants stay below the surface in the smooth tunnels crafted by the formic race many years ago.",
        ),
        SHAKESPEARE => (
            "Shakespeare Colony",
            "The next frontier for human expansion. With the buggers eliminated, we can take their land and breed the next generation of humans and crops.",
        ),
        EARTH => (
            "Earth",
            "A world doomed. A planet that needs a savior. To go back now is to let the wretched Formics win.",
        ),
        FORMIC_HOME_WORLD => (
            "Formic Home World",
            "In all of the universe, one could not find a more perfect machine working under the surface of this planet. The queen instructs, and the workers follow. Flawlessly. To see this creature is to be in awe and trembling fear at the same time.",
        ),
        _ => ("", ""),
    };
    Room {
        number,
        name: name.to_string(),
        description: description.to_string(),
    }
}

/// Outgoing edges per room, in the order they are listed to players.
const EDGES: &[(u16, &[u16])] = &[
    (BATTLE_SCHOOL, &[BARRACKS, GAME_ROOM, BATTLE_ROOM, EROS, EARTH]),
    (BARRACKS, &[BATTLE_SCHOOL]),
    (GAME_ROOM, &[BATTLE_SCHOOL]),
    (BATTLE_ROOM, &[BATTLE_SCHOOL]),
    (FORMIC_STAR_SYSTEM, &[FORMIC_HOME_WORLD, SHAKESPEARE, EROS]),
    (ROTTERDAM, &[EARTH]),
    (EROS, &[SHAKESPEARE, FORMIC_STAR_SYSTEM, BATTLE_SCHOOL]),
    (SHAKESPEARE, &[]),
    // No way back to Battle School from here.
    (EARTH, &[ROTTERDAM]),
    (FORMIC_HOME_WORLD, &[FORMIC_STAR_SYSTEM]),
];

/// Builds the room graph.
pub fn world_map() -> WorldMap {
    let rooms = EDGES
        .iter()
        .map(|&(number, targets)| {
            let node = RoomNode {
                room: room(number),
                connections: targets
                    .iter()
                    .map(|&target| Connection::from(&room(target)))
                    .collect(),
            };
            (number, node)
        })
        .collect::<BTreeMap<_, _>>();
    WorldMap::new(rooms)
}

/// The per-player gate a new character starts with.
///
/// `debug_player` names a character that starts with every secret room
/// open.
pub fn starting_unlocks(name: &str, debug_player: &str) -> HashMap<u16, bool> {
    let debug = !debug_player.is_empty() && name == debug_player;
    OPEN_ROOMS
        .map(|room| (room, true))
        .chain(SECRET_ROOMS.map(|room| (room, debug)))
        .collect()
}

// ---------------------------------------------------------------------------
// Monsters
// ---------------------------------------------------------------------------

pub const COLONEL_GRAPH: &str = "Colonel Graph";
pub const BEAN: &str = "Bean";
pub const PETRA: &str = "Petra Arkanian";
pub const MAZER: &str = "Mazer Rackham";
pub const BONZO: &str = "Bonito de Madrid";
pub const FORMIC_FLEET: &str = "Formic Fleet";
pub const HIVE_QUEEN: &str = "Hive Queen";
pub const ACHILLES: &str = "Achilles de Flandres";
pub const PETER: &str = "Peter Wiggin";
/// Cannot be swept by `Fight`; only a targeted `PvpFight` reaches it.
pub const COCOON: &str = "Hive Queen Cacoon";

struct MonsterDef {
    name: &'static str,
    attack: u16,
    defense: u16,
    regen: u16,
    health: i16,
    room: u16,
    heal_to: i16,
    reward: u16,
    monster_flag: bool,
    description: &'static str,
}

const MONSTERS: &[MonsterDef] = &[
    MonsterDef {
        name: COLONEL_GRAPH,
        attack: 20,
        defense: 100,
        regen: 100,
        health: 50,
        room: BATTLE_SCHOOL,
        heal_to: 50,
        reward: 10,
        monster_flag: true,
        description: "An older man, starting to let himself go, but sturdy non the less.",
    },
    MonsterDef {
        name: BEAN,
        attack: 10,
        defense: 100,
        regen: 100,
        health: 100,
        room: BATTLE_ROOM,
        heal_to: 100,
        reward: 15,
        monster_flag: true,
        description: "The littlest one in battle school. You would be mistaken to think that is an indication of his power, though.",
    },
    MonsterDef {
        name: PETRA,
        attack: 20,
        defense: 80,
        regen: 100,
        health: 100,
        room: GAME_ROOM,
        heal_to: 100,
        reward: 20,
        monster_flag: true,
        description: "The only girl in battle school, but she can be more dangerous that most of the boys. She could be an important teacher at this point.",
    },
    MonsterDef {
        name: MAZER,
        attack: 100,
        defense: 100,
        regen: 0,
        health: 100,
        room: EROS,
        heal_to: 100,
        reward: 100,
        monster_flag: true,
        description: "Once believed to be dead, the greatest commander in all of history has shown up again. It seems his only intention is to train the next great commander of history. He will accomplish his goal or kill someone in the process.",
    },
    MonsterDef {
        name: BONZO,
        attack: 100,
        defense: 50,
        regen: 50,
        health: 75,
        room: BATTLE_ROOM,
        heal_to: 75,
        reward: 50,
        monster_flag: true,
        description: "Benito de Madrid; pretty boy. He will fight till the death for his families honor. To cross Bonzo is to can be the worst mistake you will make in your potentially short life.",
    },
    MonsterDef {
        name: FORMIC_FLEET,
        attack: 50,
        defense: 50,
        regen: 0,
        health: 1000,
        room: FORMIC_STAR_SYSTEM,
        heal_to: 10000,
        reward: 1000,
        monster_flag: true,
        description: "A fleet of not thousands, or tens of thousands, but millions of individual formic creatures. They seems to move as if instructed by a single mind, perhaps a queen.",
    },
    MonsterDef {
        name: HIVE_QUEEN,
        attack: 0,
        defense: 0,
        regen: 0,
        health: 1000,
        room: FORMIC_HOME_WORLD,
        heal_to: 1000,
        reward: 1000,
        monster_flag: true,
        description: "The epitome of beauty and horror. There isn't a more terrifying creature imaginable by man. All the propaganda back on earth does not do justice to the fear that this creature invokes in one's heart. At the same time though, there is nothing more beautiful. You can feel her presence in your own, her mind in yours. To kill this creature is to kill your own self.",
    },
    MonsterDef {
        name: ACHILLES,
        attack: 100,
        defense: 100,
        regen: 50,
        health: 1000,
        room: ROTTERDAM,
        heal_to: 1000,
        reward: 1000,
        monster_flag: true,
        description: "This boy seems to have taken control of the streets. Starving children cling to him as their papa. However, few claim he is must more than that...",
    },
    MonsterDef {
        name: PETER,
        attack: 100,
        defense: 100,
        regen: 50,
        health: 1000,
        room: EARTH,
        heal_to: 1000,
        reward: 1000,
        monster_flag: true,
        description: "The boy who will take over the world. Peter will gain control of all those in his grasp, will you be his enemy or foe?",
    },
    MonsterDef {
        name: COCOON,
        attack: 0,
        defense: 0,
        regen: 0,
        health: 1,
        room: SHAKESPEARE,
        heal_to: 1,
        reward: 64535,
        // Alive but not flagged as a monster.
        monster_flag: false,
        description: "The next hive queen. Will you restore their race?",
    },
];

/// Builds the monster roster at full health.
pub fn monsters() -> MonsterRoster {
    MONSTERS
        .iter()
        .map(|def| {
            let flags = CharacterFlags::default()
                .with(CharacterFlags::ALIVE, true)
                .with(CharacterFlags::MONSTER, def.monster_flag);
            Monster::new(
                Character {
                    name: def.name.to_string(),
                    flags,
                    attack: def.attack,
                    defense: def.defense,
                    regen: def.regen,
                    health: def.health,
                    gold: 0,
                    room: def.room,
                    description: def.description.to_string(),
                },
                def.heal_to,
                def.reward,
            )
        })
        .collect()
}
