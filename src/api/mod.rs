pub mod attendance;
pub mod scanner;
