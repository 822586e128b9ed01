pub mod app;
pub mod arena;
pub mod communication;
pub mod drive;
pub mod feedback;
pub mod logging;
pub mod operator;
pub mod robot;
pub mod sensors;
pub mod terminal;
pub mod ui;
