use crate::modules::database::CURSOR_MODELS;
use crate::modules::error::{code::ErrorCode, MailwatchError, MailwatchResult};
use crate::raise_error;
use native_db::{Builder, Database};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Opens the cursor database at `path`, or an in-memory one when no path is
/// configured.
pub fn open_cursor_database(path: Option<&Path>) -> MailwatchResult<Arc<Database<'static>>> {
    let Some(path) = path else {
        info!("No cursor database configured, keeping cursors in memory");
        return Builder::new()
            .create_in_memory(&CURSOR_MODELS)
            .map(Arc::new)
            .map_err(handle_database_error);
    };

    info!("Initializing cursor database at: {:?}", path);
    let mut database = Builder::new()
        .create(&CURSOR_MODELS, path)
        .map_err(handle_database_error)?;
    database
        .compact()
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))?;
    Ok(Arc::new(database))
}

fn handle_database_error(error: native_db::db_type::Error) -> MailwatchError {
    match error {
        native_db::db_type::Error::RedbDatabaseError(database_error) => match database_error {
            redb::DatabaseError::DatabaseAlreadyOpen => {
                raise_error!(
                    "Cursor database is already open by another instance".into(),
                    ErrorCode::InternalError
                )
            }
            other => {
                raise_error!(
                    format!("Database error: {:?}", other),
                    ErrorCode::InternalError
                )
            }
        },
        other => {
            raise_error!(
                format!("Failed to create database: {:?}", other),
                ErrorCode::InternalError
            )
        }
    }
}
