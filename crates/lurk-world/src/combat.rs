//! Combat resolution.
//!
//! One exchange: both sides hit at once, then survivors regenerate.
//!
//! ```text
//! damage(a → b) = trunc(a.attack − a.attack × b.defense / 200)
//! regen(b)      = trunc(damage taken by b × b.regen / 500)   if b survives
//! ```
//!
//! Arithmetic is done in `f32` and truncated toward zero into `i16`, with
//! out-of-range values saturating. Defense of 200 or more cancels or
//! inverts damage; that is allowed. Health is never clamped, so a killing
//! blow usually leaves it negative.

use lurk_protocol::Character;

const DEFENSE_DIVISOR: f32 = 200.0;
const REGEN_DIVISOR: f32 = 500.0;

/// What one exchange did to each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exchange {
    /// Damage dealt to `a` by `b`.
    pub damage_to_a: i16,
    /// Damage dealt to `b` by `a`.
    pub damage_to_b: i16,
    pub a_died: bool,
    pub b_died: bool,
}

/// Damage `attacker` deals to `defender` in one exchange.
pub fn damage(attacker: &Character, defender: &Character) -> i16 {
    let attack = f32::from(attacker.attack);
    let defense = f32::from(defender.defense);
    (attack - attack * (defense / DEFENSE_DIVISOR)) as i16
}

/// Resolves one exchange between `a` and `b`, mutating both.
///
/// Deterministic: the same inputs always produce the same result. A side
/// whose health ends at or below zero loses the Alive flag and does not
/// regenerate. Callers apply rewards and notifications.
pub fn resolve_fight(a: &mut Character, b: &mut Character) -> Exchange {
    let damage_to_b = damage(a, b);
    let damage_to_a = damage(b, a);

    let a_died = take_hit(a, damage_to_a);
    let b_died = take_hit(b, damage_to_b);

    Exchange {
        damage_to_a,
        damage_to_b,
        a_died,
        b_died,
    }
}

/// Applies `damage` and regeneration to `c`. Returns `true` if `c` died.
fn take_hit(c: &mut Character, damage: i16) -> bool {
    c.health = c.health.saturating_sub(damage);
    if c.health <= 0 {
        c.set_alive(false);
        return true;
    }
    let regen = (f32::from(damage) * f32::from(c.regen) / REGEN_DIVISOR) as i16;
    c.health = c.health.saturating_add(regen);
    false
}
