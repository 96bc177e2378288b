pub mod session;

pub use session::{AuthSession, Notice, NoticeKind, SignedIn, FLASH_COOKIE, TOKEN_COOKIE};
