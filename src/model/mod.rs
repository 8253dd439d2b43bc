pub mod config {
    pub use murmur_core::config::*;
}
pub mod observer {
    pub use murmur_core::observer::*;
}
pub mod sight {
    pub use murmur_core::sight::*;
}
pub mod snapshot {
    pub use murmur_core::snapshot::*;
}
pub mod state {
    pub use murmur_data::*;
}

pub mod simulation;
