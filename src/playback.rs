pub(crate) mod ingest;
pub(crate) mod scheduler;
pub(crate) mod session;
