pub mod serve;
pub mod simulate;
pub mod train;
