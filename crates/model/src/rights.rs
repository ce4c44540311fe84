use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator as _};

use crate::errors::LedgerError;

const MEMBER_RULES: [Rule; 4] = [
    Rule::ViewProfile,
    Rule::EnrollSelf,
    Rule::BookSession,
    Rule::CancelOwnSession,
];

const TRAINER_RULES: [Rule; 5] = [
    Rule::ViewProfile,
    Rule::ViewUsers,
    Rule::ManageOwnRoster,
    Rule::EditOwnSessionStatus,
    Rule::CompleteOwnSession,
];

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Member,
    Trainer,
    Admin,
}

impl Role {
    pub fn rights(&self) -> Rights {
        match self {
            Role::Member => Rights::with_rules(&MEMBER_RULES),
            Role::Trainer => Rights::with_rules(&TRAINER_RULES),
            Role::Admin => Rights::full(),
        }
    }

    pub fn ensure(&self, rule: Rule) -> Result<(), LedgerError> {
        self.rights().ensure(rule)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Rights {
    full: bool,
    rules: Vec<Rule>,
}

impl Rights {
    pub fn full() -> Self {
        Rights {
            full: true,
            rules: vec![],
        }
    }

    fn with_rules(rules: &[Rule]) -> Self {
        Rights {
            full: false,
            rules: rules.to_vec(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.full
    }

    pub fn has_rule(&self, rule: Rule) -> bool {
        if self.full {
            return true;
        }
        self.rules.contains(&rule)
    }

    pub fn ensure(&self, rule: Rule) -> Result<(), LedgerError> {
        if !self.has_rule(rule) {
            return Err(LedgerError::Forbidden(rule));
        }
        Ok(())
    }
}

#[derive(EnumIter, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    ViewProfile,

    // users
    ViewUsers,
    CreateUser,
    EditUserRole,
    EditSpecializations,
    ChangeCredits,

    // roster
    CreateClass,
    EditClass,
    DeleteClass,
    ManageRoster,
    ManageOwnRoster,
    EnrollSelf,

    // private sessions
    BookSession,
    CancelOwnSession,
    EditOwnSessionStatus,
    EditAnySession,
    DeleteSession,
    CompleteOwnSession,

    // subscriptions
    EditSubscriptions,

    // equipment
    ManageEquipment,
}

impl Rule {
    pub fn list() -> Vec<Rule> {
        Rule::iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_holds_every_rule() {
        for rule in Rule::list() {
            assert!(Role::Admin.rights().has_rule(rule), "{:?}", rule);
        }
    }

    #[test]
    fn test_member_can_self_service_only() {
        let rights = Role::Member.rights();
        assert!(rights.has_rule(Rule::EnrollSelf));
        assert!(rights.has_rule(Rule::BookSession));
        assert!(rights.has_rule(Rule::CancelOwnSession));
        assert!(!rights.has_rule(Rule::CreateClass));
        assert!(!rights.has_rule(Rule::EditSubscriptions));
        assert!(!rights.has_rule(Rule::DeleteSession));
        assert!(!rights.has_rule(Rule::EditOwnSessionStatus));
    }

    #[test]
    fn test_trainer_manages_own_resources_only() {
        let rights = Role::Trainer.rights();
        assert!(rights.has_rule(Rule::ManageOwnRoster));
        assert!(rights.has_rule(Rule::EditOwnSessionStatus));
        assert!(rights.has_rule(Rule::CompleteOwnSession));
        assert!(!rights.has_rule(Rule::ManageRoster));
        assert!(!rights.has_rule(Rule::EditAnySession));
        assert!(!rights.has_rule(Rule::CreateClass));
        assert!(!rights.has_rule(Rule::ManageEquipment));
        assert!(!rights.has_rule(Rule::EditSpecializations));
    }

    #[test]
    fn test_ensure_reports_forbidden() {
        let err = Role::Member.ensure(Rule::DeleteSession).unwrap_err();
        assert!(matches!(
            err,
            crate::errors::LedgerError::Forbidden(Rule::DeleteSession)
        ));
    }
}
