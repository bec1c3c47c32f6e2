// Domain layer: core models and ports (interfaces). Only std, serde, thiserror and async-trait.

pub mod model;
pub mod ports;
