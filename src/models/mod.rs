pub mod alert;
pub mod client;
pub mod enums;
pub mod medication;
pub mod technician;

pub use alert::*;
pub use client::*;
pub use drug_test::*;
pub use medication::*;
pub use technician::*;
