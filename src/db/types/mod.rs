mod ticket_type;

pub use ticket_type::*;
