//! Inventory verification: is the enumerated chain complete and unique?

use std::collections::HashSet;

use crate::station::DeviceMap;

/// Decide whether a device-map snapshot covers the full chain.
///
/// Good iff the sorted slot list equals `1..=expected` and the number of
/// distinct board identities equals `expected`. The two checks are
/// independent and both necessary: a duplicated slot with unique identities
/// fails the first, a duplicated identity across valid slots fails the
/// second.
pub fn chain_is_complete(map: &DeviceMap, expected: u32) -> bool {
    let mut slots: Vec<u32> = Vec::new();
    let mut identities: HashSet<&str> = HashSet::new();

    for (_, board) in map.boards() {
        slots.push(board.slot);
        identities.insert(board.board_id.as_str());
    }
    slots.sort_unstable();

    let slots_contiguous = slots.iter().copied().eq(1..=expected);
    let identities_unique = identities.len() == expected as usize;
    slots_contiguous && identities_unique
}
