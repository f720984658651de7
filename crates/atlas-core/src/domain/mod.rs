//! 셋업 매칭을 위한 도메인 모델.

mod feature;
mod observation;
mod outcome;
mod scenario;

pub use feature::*;
pub use observation::*;
pub use outcome::*;
pub use scenario::*;
