// Capability providers
//
// One module per backend domain. Each provider owns its network I/O and
// returns described failures; the dispatcher never sees a panic or a raw
// transport error.

pub mod calendar;
pub mod files;
pub mod mail;
pub mod session;

pub use calendar::CalendarClient;
pub use files::FileStore;
pub use mail::MailClient;
pub use session::GoogleSession;
