//! Routing of a popped task to file, web, or generic execution.

use anyhow::Result;
use tracing::{debug, instrument, warn};

use crate::agents::Collaborators;
use crate::core::task::{TaskAction, classify};
use crate::io::actuators::Actuators;

/// Run `task` through the handler its prefix selects.
///
/// Never fails: handler errors and malformed structured tasks come back as a
/// descriptive result string so the loop can record them and move on.
#[instrument(skip_all, fields(task = %task))]
pub fn dispatch<C, A>(task: &str, collaborators: &C, actuators: &A) -> String
where
    C: Collaborators + ?Sized,
    A: Actuators + ?Sized,
{
    let action = classify(task);
    debug!(?action, "dispatching task");
    match route(action, collaborators, actuators) {
        Ok(result) => result,
        Err(err) => {
            warn!(err = %format!("{err:#}"), "task handler failed");
            format!("Error: {err:#}")
        }
    }
}

fn route<C, A>(action: TaskAction<'_>, collaborators: &C, actuators: &A) -> Result<String>
where
    C: Collaborators + ?Sized,
    A: Actuators + ?Sized,
{
    match action {
        TaskAction::FileCreate { filename, content } => actuators.write_file(filename, content),
        TaskAction::FileRead { filename } => actuators.read_file(filename),
        TaskAction::FileUnknown { action } => Ok(format!("Unknown file action: {action}")),
        TaskAction::FileMalformed => Ok(
            "Malformed file task: expected FILE#create#<filename>#<content> or FILE#read#<filename>"
                .to_string(),
        ),
        TaskAction::Web { query } => actuators.search(query),
        TaskAction::Plain(task) => collaborators.execute(task),
    }
}
