// apply / diff / validate
pub mod declarative;

// last-run report
pub mod status;
