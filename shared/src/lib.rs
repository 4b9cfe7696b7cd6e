// Models and number helpers shared by the engine and any front end.
pub mod models;
pub mod utils;
