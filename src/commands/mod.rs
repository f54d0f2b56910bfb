pub mod scan;
pub mod status;
pub mod wyckoff;
