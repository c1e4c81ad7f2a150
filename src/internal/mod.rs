//! Internal implementation details.

pub(crate) mod dispose_bag;
pub(crate) mod fast_map;
pub(crate) mod sync;

pub(crate) use dispose_bag::{BoxFutureUnit, DisposeBag};
