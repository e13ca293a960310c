//! # Membership Index
//!
//! Per-wallet reverse mapping of the programs a user reviews or manages.

use super::entities::{RoleAssignment, UserMembership};
use shared_types::{ProgramName, Timestamp, WalletAddress};

impl UserMembership {
    /// Empty membership record for a wallet.
    pub fn new(address: WalletAddress) -> Self {
        Self {
            address,
            reviewer_of: Vec::new(),
            manager_of: Vec::new(),
        }
    }

    /// Record a reviewer assignment. Returns `false` if the program was
    /// already listed (the original assignment date is kept).
    pub fn assign_reviewer(&mut self, program: &ProgramName, at: Timestamp) -> bool {
        assign(&mut self.reviewer_of, program, at)
    }

    /// Returns `false` if the program was not listed.
    pub fn revoke_reviewer(&mut self, program: &ProgramName) -> bool {
        revoke(&mut self.reviewer_of, program)
    }

    pub fn assign_manager(&mut self, program: &ProgramName, at: Timestamp) -> bool {
        assign(&mut self.manager_of, program, at)
    }

    pub fn revoke_manager(&mut self, program: &ProgramName) -> bool {
        revoke(&mut self.manager_of, program)
    }

    pub fn reviewer_since(&self, program: &ProgramName) -> Option<Timestamp> {
        since(&self.reviewer_of, program)
    }

    pub fn manager_since(&self, program: &ProgramName) -> Option<Timestamp> {
        since(&self.manager_of, program)
    }

    pub fn is_empty(&self) -> bool {
        self.reviewer_of.is_empty() && self.manager_of.is_empty()
    }
}

fn assign(list: &mut Vec<RoleAssignment>, program: &ProgramName, at: Timestamp) -> bool {
    if list.iter().any(|a| &a.program == program) {
        return false;
    }
    list.push(RoleAssignment {
        program: program.clone(),
        assigned_date: at,
    });
    true
}

fn revoke(list: &mut Vec<RoleAssignment>, program: &ProgramName) -> bool {
    let before = list.len();
    list.retain(|a| &a.program != program);
    list.len() != before
}

fn since(list: &[RoleAssignment], program: &ProgramName) -> Option<Timestamp> {
    list.iter()
        .find(|a| &a.program == program)
        .map(|a| a.assigned_date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn acme() -> ProgramName {
        ProgramName::parse("Acme").unwrap()
    }

    #[test]
    fn test_assign_and_revoke_reviewer() {
        let mut m = UserMembership::new(WalletAddress::parse("0xa").unwrap());
        let now = Utc::now();

        assert!(m.assign_reviewer(&acme(), now));
        assert!(!m.assign_reviewer(&acme(), now + chrono::Duration::seconds(5)));
        assert_eq!(m.reviewer_since(&acme()), Some(now));

        assert!(m.revoke_reviewer(&acme()));
        assert!(!m.revoke_reviewer(&acme()));
        assert!(m.is_empty());
    }

    #[test]
    fn test_manager_roles_are_separate_from_reviewer_roles() {
        let mut m = UserMembership::new(WalletAddress::parse("0xa").unwrap());
        let now = Utc::now();
        m.assign_reviewer(&acme(), now);
        m.assign_manager(&acme(), now);

        assert!(m.revoke_manager(&acme()));
        assert!(m.manager_since(&acme()).is_none());
        assert!(m.reviewer_since(&acme()).is_some());
        assert!(!m.is_empty());
    }
}
