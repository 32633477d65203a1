use std::collections::BTreeSet;

/// Identifier assigned to a capability when it is first registered. Stable
/// for the lifetime of the registry that handed it out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CapabilityId(u32);

impl CapabilityId {
    pub(crate) fn from_index(index: u32) -> Self {
        Self(index)
    }

    pub fn index(&self) -> u32 {
        self.0
    }
}

/// The capabilities a caller holds. Anonymous callers hold the empty set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PermissionSet {
    ids: BTreeSet<CapabilityId>,
}

impl PermissionSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: CapabilityId) -> bool {
        self.ids.insert(id)
    }

    pub fn contains(&self, id: CapabilityId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Decodes the bitmask persisted on a user row. Bit N maps to the
    /// capability with id N.
    pub fn from_bits(bits: u64) -> Self {
        let mut set = Self::default();
        for index in 0..u64::BITS {
            if bits & (1u64 << index) != 0 {
                set.ids.insert(CapabilityId(index));
            }
        }
        set
    }

    /// Encodes the set back into the persisted bitmask. Ids past the bitmask
    /// width cannot be represented and are left out.
    pub fn bits(&self) -> u64 {
        self.ids
            .iter()
            .filter(|id| id.0 < u64::BITS)
            .fold(0u64, |acc, id| acc | (1u64 << id.0))
    }

    pub fn iter(&self) -> impl Iterator<Item = CapabilityId> + '_ {
        self.ids.iter().copied()
    }
}
