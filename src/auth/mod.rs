//! Session authentication.
//!
//! The site uses a CSRF-protected login form; a successful post leaves an
//! identity cookie in the shared [`Session`](crate::session::Session) jar.

mod error;
mod login;

pub use error::AuthError;
pub use login::{MEMBERS_PATH, SESSION_COOKIE, login};
