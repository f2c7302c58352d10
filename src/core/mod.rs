pub mod config;
pub mod io;
pub mod layout;
pub mod scene;
