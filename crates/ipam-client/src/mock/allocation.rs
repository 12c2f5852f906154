//! IPv4 range arithmetic for the mock allocator

use std::fmt;
use std::net::Ipv4Addr;

/// An aligned IPv4 network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Ipv4Net {
    base: u32,
    prefix: u8,
}

impl Ipv4Net {
    /// Parse `a.b.c.d/n`; host bits must be zero
    pub(crate) fn parse(cidr: &str) -> Option<Self> {
        let (addr, prefix) = cidr.trim().split_once('/')?;
        let addr: Ipv4Addr = addr.parse().ok()?;
        let prefix: u8 = prefix.parse().ok()?;
        if prefix > 32 {
            return None;
        }
        let base = u32::from(addr);
        (base & mask(prefix) == base).then_some(Self { base, prefix })
    }

    pub(crate) fn prefix(self) -> u8 {
        self.prefix
    }

    /// Number of addresses
    pub(crate) fn len(self) -> u64 {
        1u64 << (32 - u32::from(self.prefix))
    }

    fn start(self) -> u64 {
        u64::from(self.base)
    }

    fn end(self) -> u64 {
        self.start() + self.len()
    }

    pub(crate) fn contains(self, other: Self) -> bool {
        other.prefix >= self.prefix && other.start() >= self.start() && other.end() <= self.end()
    }

    pub(crate) fn overlaps(self, other: Self) -> bool {
        self.start() < other.end() && other.start() < self.end()
    }
}

impl fmt::Display for Ipv4Net {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", Ipv4Addr::from(self.base), self.prefix)
    }
}

fn mask(prefix: u8) -> u32 {
    u32::MAX.checked_shl(32 - u32::from(prefix)).unwrap_or(0)
}

/// First free `/size` inside `block`, or the last one when `reverse` is set
pub(crate) fn carve(block: Ipv4Net, taken: &[Ipv4Net], size: u8, reverse: bool) -> Option<Ipv4Net> {
    if size < block.prefix || size > 32 {
        return None;
    }
    let step = 1u64 << (32 - u32::from(size));
    let count = block.len() / step;

    let candidate = |i: u64| {
        u32::try_from(block.start() + i * step)
            .ok()
            .map(|base| Ipv4Net { base, prefix: size })
    };
    let free = |net: &Ipv4Net| !taken.iter().any(|t| t.overlaps(*net));

    if reverse {
        (0..count).rev().filter_map(candidate).find(free)
    } else {
        (0..count).filter_map(candidate).find(free)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(s: &str) -> Ipv4Net {
        Ipv4Net::parse(s).unwrap()
    }

    #[test]
    fn test_parse_rejects_host_bits_and_bad_prefix() {
        assert!(Ipv4Net::parse("10.0.0.1/24").is_none());
        assert!(Ipv4Net::parse("10.0.0.0/33").is_none());
        assert!(Ipv4Net::parse("not-a-cidr").is_none());
        assert_eq!(net("0.0.0.0/0").len(), 1 << 32);
    }

    #[test]
    fn test_carve_forward_skips_taken() {
        let block = net("10.0.0.0/22");
        let taken = [net("10.0.0.0/24"), net("10.0.1.0/25")];
        assert_eq!(carve(block, &taken, 24, false).unwrap().to_string(), "10.0.2.0/24");
        assert_eq!(carve(block, &taken, 25, false).unwrap().to_string(), "10.0.1.128/25");
    }

    #[test]
    fn test_carve_reverse_takes_top() {
        let block = net("10.82.0.0/21");
        assert_eq!(carve(block, &[], 23, true).unwrap().to_string(), "10.82.6.0/23");
    }

    #[test]
    fn test_carve_full_or_too_large() {
        let block = net("10.0.0.0/24");
        assert!(carve(block, &[net("10.0.0.0/24")], 26, false).is_none());
        assert!(carve(block, &[], 16, false).is_none());
    }

    #[test]
    fn test_contains_and_overlaps() {
        assert!(net("10.0.0.0/16").contains(net("10.0.4.0/24")));
        assert!(!net("10.0.0.0/24").contains(net("10.0.0.0/16")));
        assert!(net("10.0.0.0/16").overlaps(net("10.0.255.0/24")));
        assert!(!net("10.0.0.0/24").overlaps(net("10.0.1.0/24")));
    }
}
