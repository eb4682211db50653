//! Allow-list credential gate.

use std::collections::BTreeSet;

use crate::interfaces::CredentialGate;
use crate::types::AccountId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct AllowList {
    allowed: BTreeSet<AccountId>,
    /// Admit every account
    allow_all: bool,
}

impl AllowList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open() -> Self {
        Self { allowed: BTreeSet::new(), allow_all: true }
    }

    pub fn allow(&mut self, account: &AccountId) {
        self.allowed.insert(account.clone());
    }

    pub fn revoke(&mut self, account: &AccountId) {
        self.allowed.remove(account);
    }
}

impl CredentialGate for AllowList {
    fn has_allowed_uid(&self, account: &AccountId) -> bool {
        self.allow_all || self.allowed.contains(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_list() {
        let alice = AccountId::from("alice");
        let mut gate = AllowList::new();
        assert!(!gate.has_allowed_uid(&alice));

        gate.allow(&alice);
        assert!(gate.has_allowed_uid(&alice));
        gate.revoke(&alice);
        assert!(!gate.has_allowed_uid(&alice));

        assert!(AllowList::open().has_allowed_uid(&alice));
    }
}
