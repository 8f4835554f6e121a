//! Driver implementations.
//!
//! - [`simulation`] - software drivers for development and testing
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement [`Driver`](crate::capability::Driver) and the domain trait
//!    (`AdcDriver`, `GpioDriver`, ...)
//! 3. Register instances through [`HalBuilder`](crate::HalBuilder) before
//!    installation

pub mod simulation;
