// Domain layer - pure emission analytics, no I/O
pub mod aggregate;
pub mod intensity;
pub mod pipeline;
pub mod record;
pub mod resolver;
pub mod series;
