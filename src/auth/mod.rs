pub mod session;

pub use session::{Session, SessionContext, SessionStore};
