pub mod delete_all;
pub mod render;
pub mod sync;
