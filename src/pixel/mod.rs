pub(crate) mod color;
pub(crate) mod convert;
pub(crate) mod format;
pub(crate) mod layout;
