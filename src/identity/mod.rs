//! Roles, sessions and the role guard.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod session;
mod authorizer;

pub use principal::{Principal, Role, UnknownRole};
pub use session::{Session, SessionId, SessionManager, DEFAULT_SESSION_TTL};
pub use authorizer::{check_access, permits, Access, ADMIN_ONLY, ANY_ROLE, STAFF_ONLY, STAFF_OR_ADMIN, STUDENT_ONLY};
