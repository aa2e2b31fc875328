pub mod hashmap_userdb;
pub mod resolver;
pub mod roles;
pub mod session;
pub mod user;
pub mod userdb;

pub use hashmap_userdb::HashMapUserDb;
pub use resolver::{AuthState, ResolverPhase, SessionResolver};
pub use roles::{HashMapRoleDb, Role, RoleChecker, RoleDb, RoleId};
pub use session::{AdminSession, SessionId, UserInfo, UserSession};
pub use user::{User, UserCredentials, UserId, UserRegistration};
pub use userdb::{SessionChange, UserDb};
