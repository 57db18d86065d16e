pub use xs_devs_error::{HalError, HalResult};
