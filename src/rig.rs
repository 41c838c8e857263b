pub(crate) mod model;
pub(crate) mod pose;
pub(crate) mod skin;
