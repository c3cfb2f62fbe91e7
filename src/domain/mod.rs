// Domain layer: catalog entities, quotes and the ports the engine talks through.

pub mod catalog;
pub mod model;
pub mod ports;
pub mod quote;
