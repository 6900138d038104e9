// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Dual-stack longest prefix match table

use crate::prefix::Prefix;
use ipnet::{Ipv4Net, Ipv6Net};
use prefix_trie::PrefixMap;
use std::net::IpAddr;

/// Key wrappers so that the trie can store our prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct V4Key(Ipv4Net);
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct V6Key(Ipv6Net);

impl prefix_trie::Prefix for V4Key {
    type R = u32;
    fn repr(&self) -> u32 {
        self.0.network().to_bits()
    }
    fn prefix_len(&self) -> u8 {
        self.0.prefix_len()
    }
    fn from_repr_len(repr: u32, len: u8) -> Self {
        // the trie never builds lengths beyond the width of the representation
        let len = len.min(Prefix::MAX_LEN_IPV4);
        let net = Ipv4Net::new(repr.into(), len).map_or_else(|_| Ipv4Net::default(), |n| n.trunc());
        V4Key(net)
    }
}

impl prefix_trie::Prefix for V6Key {
    type R = u128;
    fn repr(&self) -> u128 {
        self.0.network().to_bits()
    }
    fn prefix_len(&self) -> u8 {
        self.0.prefix_len()
    }
    fn from_repr_len(repr: u128, len: u8) -> Self {
        let len = len.min(Prefix::MAX_LEN_IPV6);
        let net = Ipv6Net::new(repr.into(), len).map_or_else(|_| Ipv6Net::default(), |n| n.trunc());
        V6Key(net)
    }
}

/// A table mapping IPv4 and IPv6 prefixes to values, with exact-match and
/// longest-prefix-match lookups.
#[derive(Clone)]
pub struct LpmTable<V> {
    v4: PrefixMap<V4Key, V>,
    v6: PrefixMap<V6Key, V>,
}

impl<V: std::fmt::Debug> std::fmt::Debug for LpmTable<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<V> Default for LpmTable<V> {
    fn default() -> Self {
        Self {
            v4: PrefixMap::new(),
            v6: PrefixMap::new(),
        }
    }
}

impl<V> LpmTable<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value for a prefix, returning the value it replaces, if any.
    pub fn insert(&mut self, prefix: Prefix, value: V) -> Option<V> {
        match prefix {
            Prefix::V4(p) => self.v4.insert(V4Key(p), value),
            Prefix::V6(p) => self.v6.insert(V6Key(p), value),
        }
    }

    pub fn remove(&mut self, prefix: &Prefix) -> Option<V> {
        match prefix {
            Prefix::V4(p) => self.v4.remove(&V4Key(*p)),
            Prefix::V6(p) => self.v6.remove(&V6Key(*p)),
        }
    }

    /// Exact-match lookup. This does not do LPM.
    #[must_use]
    pub fn get(&self, prefix: &Prefix) -> Option<&V> {
        match prefix {
            Prefix::V4(p) => self.v4.get(&V4Key(*p)),
            Prefix::V6(p) => self.v6.get(&V6Key(*p)),
        }
    }

    /// Longest-prefix-match lookup of an address
    #[must_use]
    pub fn lookup(&self, addr: IpAddr) -> Option<(Prefix, &V)> {
        match addr {
            IpAddr::V4(a) => self
                .v4
                .get_lpm(&V4Key(Ipv4Net::from(a)))
                .map(|(k, v)| (Prefix::V4(k.0), v)),
            IpAddr::V6(a) => self
                .v6
                .get_lpm(&V6Key(Ipv6Net::from(a)))
                .map(|(k, v)| (Prefix::V6(k.0), v)),
        }
    }

    /// Iterate over all the entries, IPv4 first
    pub fn iter(&self) -> impl Iterator<Item = (Prefix, &V)> {
        self.v4
            .iter()
            .map(|(k, v)| (Prefix::V4(k.0), v))
            .chain(self.v6.iter().map(|(k, v)| (Prefix::V6(k.0), v)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.v4.len() + self.v6.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn prefix(s: &str) -> Prefix {
        Prefix::try_from(s).unwrap()
    }

    #[test]
    fn lpm_picks_most_specific() {
        let mut table = LpmTable::new();
        table.insert(prefix("0.0.0.0/0"), "default");
        table.insert(prefix("10.0.0.0/8"), "ten");
        table.insert(prefix("10.1.0.0/16"), "ten-one");
        table.insert(prefix("2001:db8::/32"), "doc");

        let lookup = |a: &str| table.lookup(a.parse().unwrap()).map(|(p, v)| (p.to_string(), *v));
        assert_eq!(lookup("10.1.2.3"), Some(("10.1.0.0/16".into(), "ten-one")));
        assert_eq!(lookup("10.2.2.3"), Some(("10.0.0.0/8".into(), "ten")));
        assert_eq!(lookup("11.0.0.1"), Some(("0.0.0.0/0".into(), "default")));
        assert_eq!(lookup("2001:db8::1"), Some(("2001:db8::/32".into(), "doc")));
        assert_eq!(lookup("2001:db9::1"), None);
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn remove_falls_back_to_shorter_prefix() {
        let mut table = LpmTable::new();
        table.insert(prefix("10.0.0.0/8"), 1);
        table.insert(prefix("10.1.0.0/16"), 2);
        assert_eq!(table.remove(&prefix("10.1.0.0/16")), Some(2));
        assert_eq!(table.remove(&prefix("10.1.0.0/16")), None);
        let addr = IpAddr::V4(Ipv4Addr::new(10, 1, 0, 1));
        assert_eq!(table.lookup(addr).map(|(_, v)| *v), Some(1));
        assert_eq!(table.get(&prefix("10.0.0.0/8")), Some(&1));
        assert_eq!(table.get(&prefix("10.0.0.0/9")), None);
    }

    #[test]
    fn insert_replaces() {
        let mut table = LpmTable::new();
        assert_eq!(table.insert(prefix("::/0"), 'a'), None);
        assert_eq!(table.insert(prefix("::/0"), 'b'), Some('a'));
        assert_eq!(table.len(), 1);
        let entries: Vec<_> = table.iter().collect();
        assert_eq!(entries, vec![(prefix("::/0"), &'b')]);
    }

    #[test]
    fn lookup_matches_linear_scan() {
        bolero::check!()
            .with_type::<(Vec<(u32, u8)>, u32)>()
            .for_each(|(entries, addr)| {
                let mut table = LpmTable::new();
                for (net, len) in entries {
                    let p = Prefix::new(IpAddr::V4(Ipv4Addr::from(*net)), len % 33).unwrap();
                    table.insert(p, p);
                }
                let addr = IpAddr::V4(Ipv4Addr::from(*addr));
                let expected = table
                    .iter()
                    .filter(|(p, _)| p.covers_addr(&addr))
                    .max_by_key(|(p, _)| p.length())
                    .map(|(p, _)| p);
                assert_eq!(table.lookup(addr).map(|(p, _)| p), expected);
            });
    }

    #[test]
    fn v6_host_routes() {
        let mut table = LpmTable::new();
        let host = Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 7);
        table.insert(Prefix::host(host.into()), ());
        assert!(table.lookup(host.into()).is_some());
        assert!(table.lookup(Ipv6Addr::LOCALHOST.into()).is_none());
    }
}
