pub mod model;
pub mod render;

pub use model::{Documentation, EventDoc, FunctionDoc, ParamDoc, VariableDoc};
pub use render::{export_file_name, render_markdown};
