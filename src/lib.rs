// Attache - tool-call dispatch runtime for a mail/calendar/file assistant
// Library exports

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod providers;
pub mod tools;

use config::Config;
use providers::{calendar, files, mail, CalendarClient, FileStore, GoogleSession, MailClient};
use tools::{Dispatcher, Registry};

/// Assemble the full dispatcher: one shared backend session, every
/// provider bound against the catalog. Fails if the bindings and the
/// catalog disagree, which is a build-time integrity violation.
pub fn build_dispatcher(config: &Config) -> anyhow::Result<Dispatcher> {
    let session = Arc::new(GoogleSession::new(config.token_path.clone()));
    let mail_client = Arc::new(MailClient::new(session.clone()));
    let calendar_client = Arc::new(CalendarClient::new(session, config.time_zone.clone()));
    let file_store = Arc::new(FileStore::new(config.working_dir.clone()));

    let builder = Registry::builder();
    let builder = files::register(builder, file_store);
    let builder = mail::register(builder, mail_client);
    let builder = calendar::register(builder, calendar_client);

    Ok(Dispatcher::new(builder.finish()?))
}
