pub mod array;
pub mod object;
