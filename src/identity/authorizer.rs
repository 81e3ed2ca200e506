use super::principal::{Principal, Role};

/// Route role requirements used by the router.
pub const ANY_ROLE: &[Role] = &Role::ALL;
pub const STUDENT_ONLY: &[Role] = &[Role::Student];
pub const STAFF_ONLY: &[Role] = &[Role::Staff];
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];
pub const STAFF_OR_ADMIN: &[Role] = &[Role::Staff, Role::Admin];

/// Outcome of the role guard for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Granted(Principal),
    /// No session (or an expired one).
    Unauthenticated,
    /// A session exists but its role is not allowed on the route.
    Forbidden(Principal),
}

pub fn permits(role: Role, allowed: &[Role]) -> bool {
    allowed.contains(&role)
}

/// The single authorization decision every route goes through.
pub fn check_access(principal: Option<Principal>, allowed: &[Role]) -> Access {
    match principal {
        None => Access::Unauthenticated,
        Some(p) if permits(p.role, allowed) => Access::Granted(p),
        Some(p) => Access::Forbidden(p),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_session_is_unauthenticated() {
        assert_eq!(check_access(None, ANY_ROLE), Access::Unauthenticated);
    }

    #[test]
    fn role_outside_allowed_set_is_forbidden() {
        let p = Principal::new(Role::Student, "s@x.com");
        assert_eq!(check_access(Some(p.clone()), STAFF_OR_ADMIN), Access::Forbidden(p));
    }

    #[test]
    fn allowed_roles_are_granted() {
        for role in [Role::Staff, Role::Admin] {
            let p = Principal::new(role, "u@x.com");
            assert_eq!(check_access(Some(p.clone()), STAFF_OR_ADMIN), Access::Granted(p));
        }
        assert!(permits(Role::Student, ANY_ROLE));
        assert!(!permits(Role::Staff, ADMIN_ONLY));
    }
}
