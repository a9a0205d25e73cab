pub mod cancel_escrow;
pub mod initialize_escrow;
pub mod release_payment;
pub mod submit_proof;

pub use cancel_escrow::*;
pub use initialize_escrow::*;
pub use release_payment::*;
pub use submit_proof::*;
