//! # Role Registry
//!
//! Authoritative reviewer set and manager slot of a `BountyProgram`.
//! The registry holds no cross-record invariants; keeping the Membership
//! Index and vote ledgers in step is the Coordinator's job.

use super::entities::BountyProgram;
use super::errors::{EntityKind, GovernanceError, GovernanceResult};
use shared_types::WalletAddress;

impl BountyProgram {
    pub fn is_reviewer(&self, address: &WalletAddress) -> bool {
        self.reviewer_addresses.contains(address)
    }

    pub fn is_manager(&self, address: &WalletAddress) -> bool {
        self.manager_address.as_ref() == Some(address)
    }

    /// Add a reviewer. Fails with `Conflict` if already present.
    pub fn add_reviewer(&mut self, address: WalletAddress) -> GovernanceResult<()> {
        if self.reviewer_addresses.contains(&address) {
            return Err(GovernanceError::Conflict(format!(
                "{} is already a reviewer of {}",
                address, self.name
            )));
        }
        self.reviewer_addresses.insert(address);
        Ok(())
    }

    /// Remove a reviewer. Fails with `NotFound` if absent.
    pub fn remove_reviewer(&mut self, address: &WalletAddress) -> GovernanceResult<()> {
        if !self.reviewer_addresses.remove(address) {
            return Err(GovernanceError::not_found(EntityKind::Reviewer, address));
        }
        Ok(())
    }

    /// Assign (or overwrite) the manager, returning the previous one.
    /// Fails with `Conflict` if `address` is already the manager.
    pub fn set_manager(&mut self, address: WalletAddress) -> GovernanceResult<Option<WalletAddress>> {
        if self.is_manager(&address) {
            return Err(GovernanceError::Conflict(format!(
                "{} is already the manager of {}",
                address, self.name
            )));
        }
        Ok(self.manager_address.replace(address))
    }

    /// Clear the manager, returning who it was. Fails with `NotFound` when
    /// no manager is assigned.
    pub fn clear_manager(&mut self) -> GovernanceResult<WalletAddress> {
        self.manager_address
            .take()
            .ok_or_else(|| GovernanceError::not_found(EntityKind::Manager, &self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;
    use shared_types::ProgramName;

    fn addr(s: &str) -> WalletAddress {
        WalletAddress::parse(s).unwrap()
    }

    fn program() -> BountyProgram {
        BountyProgram::new(ProgramName::parse("Acme").unwrap())
    }

    #[test]
    fn test_add_reviewer_twice_conflicts() {
        let mut p = program();
        p.add_reviewer(addr("0xA")).unwrap();
        let err = p.add_reviewer(addr("0xa")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(p.reviewer_addresses.len(), 1);
    }

    #[test]
    fn test_remove_absent_reviewer_not_found() {
        let mut p = program();
        let err = p.remove_reviewer(&addr("0xb")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_set_manager_returns_previous() {
        let mut p = program();
        assert_eq!(p.set_manager(addr("0xold")).unwrap(), None);
        assert_eq!(p.set_manager(addr("0xnew")).unwrap(), Some(addr("0xold")));
        assert!(p.is_manager(&addr("0xNEW")));
    }

    #[test]
    fn test_set_same_manager_conflicts() {
        let mut p = program();
        p.set_manager(addr("0xm")).unwrap();
        assert_eq!(p.set_manager(addr("0xM")).unwrap_err().kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_clear_manager() {
        let mut p = program();
        assert_eq!(p.clear_manager().unwrap_err().kind(), ErrorKind::NotFound);
        p.set_manager(addr("0xm")).unwrap();
        assert_eq!(p.clear_manager().unwrap(), addr("0xm"));
        assert!(p.manager_address.is_none());
    }
}
