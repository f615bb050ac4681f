mod commands;
mod error;
mod events;
mod matcher;
mod models;
mod numbers;
mod policy;
pub mod protocol;
mod queue;
mod todo;

pub use commands::AppCommand;
pub use error::{CommandError, PolicyError, PolicyList, StreamIdError};
pub use events::{IngestEvent, Sequenced};
pub use matcher::{
    match_command, AddCommand, CommandMatch, MatchPolicy, PermissionFlags, RemovalMode,
    RemoveCommand, TriggerWords, Verdict,
};
pub use models::{
    Comment, Identity, NumberedRequest, Platform, RequestEntry, StreamId, DISPLAY_TIME_FORMAT,
};
pub use numbers::{is_number_list, parse_numbers, MAX_RANGE_SPAN};
pub use policy::{PolicySnapshot, PolicyStore};
pub use queue::RequestQueue;
pub use todo::{escape_xml, render_todo_xml};
