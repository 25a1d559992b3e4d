pub mod hpack;
pub mod linebreak;
