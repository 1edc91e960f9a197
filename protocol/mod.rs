pub mod parser;
pub mod request;
pub mod term;

pub use parser::{RespParser, RespValue};
pub use request::RespEncoder;
pub use term::Term;
