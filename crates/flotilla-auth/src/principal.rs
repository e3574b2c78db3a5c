//! Login principals and coarse role predicates.

use flotilla_core::Tag;

/// The identity bound to one live connection after login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// A human operator authenticated as a user.
    Client {
        /// The user's tag.
        user: Tag,
    },
    /// The agent process running on one machine.
    MachineAgent {
        /// The machine's tag.
        tag: Tag,
        /// Whether the machine hosts the control plane itself. Manager
        /// agents are entitled to environment-wide operations.
        manager: bool,
    },
    /// The agent process running one unit.
    UnitAgent {
        /// The unit's tag.
        tag: Tag,
    },
}

/// Role predicates over the login principal, evaluated at facade
/// construction time.
#[derive(Debug, Clone)]
pub struct Authorizer {
    principal: Principal,
}

impl Authorizer {
    pub fn new(principal: Principal) -> Authorizer {
        Authorizer { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn auth_client(&self) -> bool {
        matches!(self.principal, Principal::Client { .. })
    }

    pub fn auth_machine_agent(&self) -> bool {
        matches!(self.principal, Principal::MachineAgent { .. })
    }

    pub fn auth_unit_agent(&self) -> bool {
        matches!(self.principal, Principal::UnitAgent { .. })
    }

    /// Whether the principal is entitled to environment-wide management
    /// operations: a machine agent on a manager machine.
    pub fn auth_environ_manager(&self) -> bool {
        matches!(self.principal, Principal::MachineAgent { manager: true, .. })
    }

    /// True iff `tag` denotes the logged-in principal itself.
    ///
    /// Always false for client users: they have no single owner tag, and
    /// client capability is gated by [`Authorizer::auth_client`] instead.
    pub fn auth_owner(&self, tag: &Tag) -> bool {
        match &self.principal {
            Principal::Client { .. } => false,
            Principal::MachineAgent { tag: own, .. } => own == tag,
            Principal::UnitAgent { tag: own } => own == tag,
        }
    }

    /// The principal's own tag, for stamping "who performed this".
    pub fn auth_tag(&self) -> &Tag {
        match &self.principal {
            Principal::Client { user } => user,
            Principal::MachineAgent { tag, .. } => tag,
            Principal::UnitAgent { tag } => tag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_roles() {
        let auth = Authorizer::new(Principal::Client {
            user: Tag::user("admin"),
        });
        assert!(auth.auth_client());
        assert!(!auth.auth_machine_agent());
        assert!(!auth.auth_unit_agent());
        assert!(!auth.auth_environ_manager());
        // Clients never own entities, not even their own user tag.
        assert!(!auth.auth_owner(&Tag::user("admin")));
        assert_eq!(auth.auth_tag(), &Tag::user("admin"));
    }

    #[test]
    fn machine_agent_roles() {
        let auth = Authorizer::new(Principal::MachineAgent {
            tag: Tag::machine("0"),
            manager: false,
        });
        assert!(auth.auth_machine_agent());
        assert!(!auth.auth_environ_manager());
        assert!(auth.auth_owner(&Tag::machine("0")));
        assert!(!auth.auth_owner(&Tag::machine("1")));
    }

    #[test]
    fn manager_machine_agent_is_environ_manager() {
        let auth = Authorizer::new(Principal::MachineAgent {
            tag: Tag::machine("0"),
            manager: true,
        });
        assert!(auth.auth_environ_manager());
        assert!(auth.auth_machine_agent());
    }

    #[test]
    fn unit_agent_roles() {
        let auth = Authorizer::new(Principal::UnitAgent {
            tag: Tag::unit("wordpress/0"),
        });
        assert!(auth.auth_unit_agent());
        assert!(!auth.auth_machine_agent());
        assert!(auth.auth_owner(&Tag::unit("wordpress/0")));
        assert!(!auth.auth_owner(&Tag::unit("mysql/0")));
    }
}
