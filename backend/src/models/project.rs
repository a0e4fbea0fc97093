use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::constants::MAX_PROJECT_SLOTS;

/// One slot of the voting contract's project table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub slot: usize,
    pub name: String,
    pub symbol: String,
    pub address: Address,
    pub raw_votes: U256,
}

impl Project {
    /// Slots with a blank name are unused by the contract.
    pub fn is_active(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// A zero-vote placeholder, used for configured fallback data.
    pub fn placeholder(slot: usize, name: &str, symbol: &str) -> Self {
        Self {
            slot,
            name: name.to_string(),
            symbol: symbol.to_string(),
            address: Address::ZERO,
            raw_votes: U256::ZERO,
        }
    }
}

/// Zips the four parallel arrays returned by `getProjects()` into slots.
///
/// The contract guarantees equal lengths. If a provider ever hands back short
/// arrays, the missing values for that slot fall back to empty/zero rather
/// than dropping the whole table. Anything past the contract's slot count is
/// ignored.
pub fn projects_from_slots(
    names: &[String],
    symbols: &[String],
    addresses: &[Address],
    votes: &[U256],
) -> Vec<Project> {
    names
        .iter()
        .take(MAX_PROJECT_SLOTS)
        .enumerate()
        .map(|(slot, name)| Project {
            slot,
            name: name.clone(),
            symbol: symbols.get(slot).cloned().unwrap_or_default(),
            address: addresses.get(slot).copied().unwrap_or(Address::ZERO),
            raw_votes: votes.get(slot).copied().unwrap_or(U256::ZERO),
        })
        .collect()
}

/// Parses `Name:SYM;Other:OTH` into zero-vote placeholder projects.
pub fn parse_fallback_projects(raw: &str) -> Vec<Project> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .enumerate()
        .map(|(slot, entry)| {
            let (name, symbol) = entry.split_once(':').unwrap_or((entry, ""));
            Project::placeholder(slot, name.trim(), symbol.trim())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_stay_aligned() {
        let names = vec!["A".to_string(), "".to_string(), "B".to_string()];
        let symbols = vec!["AAA".to_string(), "".to_string(), "BBB".to_string()];
        let addresses = vec![Address::repeat_byte(1), Address::ZERO, Address::repeat_byte(2)];
        let votes = vec![U256::from(5u64), U256::ZERO, U256::from(10u64)];

        let projects = projects_from_slots(&names, &symbols, &addresses, &votes);

        assert_eq!(projects.len(), 3);
        assert_eq!(projects[2].slot, 2);
        assert_eq!(projects[2].symbol, "BBB");
        assert_eq!(projects[2].address, Address::repeat_byte(2));
        assert_eq!(projects[2].raw_votes, U256::from(10u64));
        assert!(!projects[1].is_active());
    }

    #[test]
    fn test_short_arrays_degrade_per_slot() {
        let names = vec!["A".to_string(), "B".to_string()];
        let symbols = vec!["AAA".to_string()];

        let projects = projects_from_slots(&names, &symbols, &[], &[U256::from(3u64)]);

        assert_eq!(projects[0].raw_votes, U256::from(3u64));
        assert_eq!(projects[1].symbol, "");
        assert_eq!(projects[1].address, Address::ZERO);
        assert_eq!(projects[1].raw_votes, U256::ZERO);
    }

    #[test]
    fn test_extra_slots_are_ignored() {
        let names: Vec<String> = (0..25).map(|i| format!("P{}", i)).collect();

        let projects = projects_from_slots(&names, &[], &[], &[]);

        assert_eq!(projects.len(), MAX_PROJECT_SLOTS);
        assert_eq!(projects.last().map(|p| p.name.as_str()), Some("P19"));
    }

    #[test]
    fn test_whitespace_name_is_inactive() {
        assert!(!Project::placeholder(0, "   ", "X").is_active());
        assert!(Project::placeholder(0, " Jade ", "X").is_active());
    }

    #[test]
    fn test_parse_fallback_projects() {
        let projects = parse_fallback_projects("Alpha:ALP; Beta : BET ;;Gamma");

        assert_eq!(projects.len(), 3);
        assert_eq!(projects[1].name, "Beta");
        assert_eq!(projects[1].symbol, "BET");
        assert_eq!(projects[2].symbol, "");
        assert!(projects.iter().all(|p| p.raw_votes.is_zero()));
    }
}
