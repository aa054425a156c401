pub mod inspect;
pub mod parse;
