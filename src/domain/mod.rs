pub mod actuator;
pub mod anomaly;
pub mod faults;
pub mod state;

pub use actuator::*;
pub use anomaly::*;
pub use faults::*;
pub use state::*;
