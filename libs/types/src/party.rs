//! Parties and role capabilities
//!
//! A party (bank, firm, household) holds a set of independent role
//! capabilities instead of sitting in a deep type hierarchy: an agent that
//! both lends and holds stock simply carries both roles. Markets check roles
//! when validating order submissions.

use crate::ids::PartyId;
use crate::ledger::Portfolio;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// Independent role capabilities a party can hold.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Lender,
    Borrower,
    Shareholder,
    Depositor,
}

/// A market participant with its role set and allocation ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub party_id: PartyId,
    roles: BTreeSet<Role>,
    pub portfolio: Portfolio,
}

impl Party {
    pub fn new(cash: Decimal, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            party_id: PartyId::new(),
            roles: roles.into_iter().collect(),
            portfolio: Portfolio::new(cash),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn roles(&self) -> Vec<Role> {
        self.roles.iter().copied().collect()
    }

    pub fn grant_role(&mut self, role: Role) {
        self.roles.insert(role);
    }

    pub fn revoke_role(&mut self, role: Role) {
        self.roles.remove(&role);
    }
}

/// Registry of all parties in one simulation.
///
/// Keyed by a BTreeMap so iteration order is deterministic. Owned by the
/// simulation context; markets borrow it mutably for the duration of a
/// single event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Parties {
    parties: BTreeMap<PartyId, Party>,
}

impl Parties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a party, returning its id.
    pub fn insert(&mut self, party: Party) -> PartyId {
        let id = party.party_id;
        self.parties.insert(id, party);
        id
    }

    pub fn get(&self, id: &PartyId) -> Option<&Party> {
        self.parties.get(id)
    }

    pub fn get_mut(&mut self, id: &PartyId) -> Option<&mut Party> {
        self.parties.get_mut(id)
    }

    pub fn contains(&self, id: &PartyId) -> bool {
        self.parties.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.parties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parties.is_empty()
    }

    /// Deterministic iteration over all parties.
    pub fn iter(&self) -> impl Iterator<Item = (&PartyId, &Party)> {
        self.parties.iter()
    }
}
