pub(crate) mod logging;

pub(crate) mod mem_storage;

pub(crate) mod rvb;
