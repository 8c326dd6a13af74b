pub(crate) mod accel;
pub(crate) mod audio;
pub(crate) mod blend;
pub(crate) mod frame;
pub(crate) mod image;
pub(crate) mod orchestrator;
pub(crate) mod settings;
