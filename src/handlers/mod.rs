pub mod cart;
pub mod clients;
pub mod orders;
pub mod products;
