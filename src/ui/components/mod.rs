mod alert;
mod editable_field;
mod input;
mod key_result;
mod search_input;

pub use editable_field::{EditableField, FieldEvent, FieldOptions};
pub use key_result::KeyResult;
pub use search_input::{SearchEvent, SearchInput};
