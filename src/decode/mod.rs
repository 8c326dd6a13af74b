pub(crate) mod codec;
pub(crate) mod packet;
pub(crate) mod video;
