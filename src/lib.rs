pub mod attribution;
pub mod config;
pub mod grid;
pub mod h2h;
pub mod lambda;
pub mod predict;
