pub mod contract;
pub mod inspect;
