//! Data model shared by the store, the views and the saved document format

mod view_data;
mod view_name;

pub use view_data::{Cell, FieldValue, Item, Row, ViewData, ViewDataMap};
pub use view_name::ViewName;
