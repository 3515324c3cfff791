mod command_input;
mod create_modal;
mod input;
mod key_result;
mod search_input;
mod todo_form;

pub use command_input::{CommandEvent, CommandInput};
pub use create_modal::CreateTodoModal;
pub use key_result::KeyResult;
pub use search_input::{SearchEvent, SearchInput};
pub use todo_form::{FormEvent, TodoForm};
