/// Baby Jubjub group implementation (twisted Edwards curve over the BN254 scalar field).
pub mod baby_jubjub;

pub use baby_jubjub::BabyJubJub;
