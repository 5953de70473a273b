pub mod cli;
pub mod cloud;
pub mod io;
pub mod model;
pub mod ops;
pub mod presenter;
