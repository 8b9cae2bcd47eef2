/// Relation of another tile that a tile is standing in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProxyId {
    Child1,
    Child2,
    Child3,
    Child4,
    Parent,
    Parent2,
}

impl ProxyId {
    pub const ALL: [ProxyId; 6] = [
        ProxyId::Child1,
        ProxyId::Child2,
        ProxyId::Child3,
        ProxyId::Child4,
        ProxyId::Parent,
        ProxyId::Parent2,
    ];

    pub const CHILDREN: [ProxyId; 4] = [
        ProxyId::Child1,
        ProxyId::Child2,
        ProxyId::Child3,
        ProxyId::Child4,
    ];

    /// Child relation for the child at `index` in `TileId::children()` order.
    pub fn child(index: usize) -> Option<ProxyId> {
        Self::CHILDREN.get(index).copied()
    }

    /// Ancestor relation `levels` steps up (1 = parent, 2 = grandparent).
    pub fn ancestor(levels: u8) -> Option<ProxyId> {
        match levels {
            1 => Some(ProxyId::Parent),
            2 => Some(ProxyId::Parent2),
            _ => None,
        }
    }
}

bitflags::bitflags! {
    /// Set of proxy relations, one independent flag per `ProxyId`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Proxies: u8 {
        const CHILD1 = 1 << 0;
        const CHILD2 = 1 << 1;
        const CHILD3 = 1 << 2;
        const CHILD4 = 1 << 3;
        const PARENT = 1 << 4;
        const PARENT2 = 1 << 5;
    }
}

impl From<ProxyId> for Proxies {
    fn from(id: ProxyId) -> Self {
        match id {
            ProxyId::Child1 => Proxies::CHILD1,
            ProxyId::Child2 => Proxies::CHILD2,
            ProxyId::Child3 => Proxies::CHILD3,
            ProxyId::Child4 => Proxies::CHILD4,
            ProxyId::Parent => Proxies::PARENT,
            ProxyId::Parent2 => Proxies::PARENT2,
        }
    }
}

impl Proxies {
    pub fn has(self, id: ProxyId) -> bool {
        self.contains(id.into())
    }

    /// Relations present in the set, in `ProxyId::ALL` order.
    pub fn relations(self) -> impl Iterator<Item = ProxyId> {
        ProxyId::ALL.into_iter().filter(move |id| self.has(*id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_are_independent() {
        let mut proxies = Proxies::empty();
        proxies.insert(ProxyId::Child2.into());
        proxies.insert(ProxyId::Parent2.into());
        assert!(proxies.has(ProxyId::Child2));
        assert!(!proxies.has(ProxyId::Child1));
        assert_eq!(proxies, Proxies::CHILD2 | Proxies::PARENT2);
        assert_eq!(
            proxies.relations().collect::<Vec<_>>(),
            vec![ProxyId::Child2, ProxyId::Parent2]
        );

        proxies.remove(Proxies::CHILD2);
        assert!(proxies.has(ProxyId::Parent2));
        proxies.remove(Proxies::PARENT2);
        assert!(proxies.is_empty());
    }

    #[test]
    fn test_every_relation_has_its_own_flag() {
        let all = ProxyId::ALL
            .into_iter()
            .fold(Proxies::empty(), |acc, id| acc | Proxies::from(id));
        assert_eq!(all, Proxies::all());
        assert_eq!(all.relations().count(), ProxyId::ALL.len());
    }

    #[test]
    fn test_relation_lookup() {
        assert_eq!(ProxyId::child(3), Some(ProxyId::Child4));
        assert_eq!(ProxyId::child(4), None);
        assert_eq!(ProxyId::ancestor(2), Some(ProxyId::Parent2));
        assert_eq!(ProxyId::ancestor(3), None);
    }
}
