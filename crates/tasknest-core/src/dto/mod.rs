//! Wire types: inbound commands and outbound views.

mod command;
mod view;

pub use command::{
    AddCategoryCmd, AddTodoItemCmd, AddTodoTaskCmd, DeleteTodoItemQuery, EditCategoryCmd,
    EditTodoItemCmd, EditTodoTaskCmd, Targeted, TodoItemQuery,
};
pub use view::{
    CategoryView, Created, TodoItemDetail, TodoItemSummary, TodoTaskView, TodoTaskWithItem,
};
