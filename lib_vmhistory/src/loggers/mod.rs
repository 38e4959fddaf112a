/// Console and file logging backend with rotation.
pub mod loggerlocal;
