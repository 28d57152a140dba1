// Domain layer: API models and ports. Concrete adapters live under config/.

pub mod model;
pub mod ports;
