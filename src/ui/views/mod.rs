mod todo_detail;
mod todo_list;

pub use todo_detail::TodoDetailView;
pub use todo_list::TodoListView;
