// Domain layer: LIMS records, label configuration and the ports the core talks to.

pub mod model;
pub mod ports;
