//! The three pure stage entry points (`run_lrb`, `run_mrs`, `run_srfs`),
//! each taking a wire `*Input` and returning a wire `*Output` without ever
//! propagating a `Result::Err`.

pub mod lrb;
pub mod mrs;
pub mod srfs;
