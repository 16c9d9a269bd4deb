pub mod shell;
pub mod widgets;

pub use shell::run;
