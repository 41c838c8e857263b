pub(crate) mod character;
pub(crate) mod frame;
pub(crate) mod reader;
