pub mod math;
pub mod ranges;

pub use ranges::{
    PeptideRange,
    TupleRange,
};
