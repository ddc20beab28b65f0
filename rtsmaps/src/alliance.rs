//! Alliance counting from force assignments

use crate::scenario::PlayerType;

/// Player slots described by force data
pub const MAX_PLAYERS: usize = 8;

/// Forces a player can be assigned to
pub const MAX_FORCES: usize = 4;

/// Force flag bit marking its members as allied
const FORCE_ALLIED: u8 = 0b10;

/// Count the effective alliances in play
///
/// Every allied force with at least one active member counts once, and every
/// active player outside an allied force counts on their own. When all active
/// players share a single allied force the result is the number of active
/// players instead. A player assigned to a force beyond [`MAX_FORCES`] is
/// treated as unallied.
pub fn resolve_alliances(
    player_types: &[PlayerType; MAX_PLAYERS],
    player_forces: &[u8; MAX_PLAYERS],
    force_flags: &[u8; MAX_FORCES],
) -> u32 {
    let is_allied_force = force_flags.map(|flags| flags & FORCE_ALLIED != 0);

    let mut is_active_force = [false; MAX_FORCES];
    let mut non_allied_players = 0u32;
    let mut active_players = 0u32;

    for (player_type, &force) in player_types.iter().zip(player_forces) {
        if !player_type.is_active() {
            continue;
        }
        active_players += 1;

        match is_active_force.get_mut(usize::from(force)) {
            Some(active) => {
                *active = true;
                if !is_allied_force[usize::from(force)] {
                    non_allied_players += 1;
                }
            }
            None => non_allied_players += 1,
        }
    }

    let allied_forces = is_active_force
        .iter()
        .zip(&is_allied_force)
        .filter(|&(&active, &allied)| active && allied)
        .count() as u32;

    if allied_forces == 1 && non_allied_players == 0 {
        active_players
    } else {
        allied_forces + non_allied_players
    }
}
