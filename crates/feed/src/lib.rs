pub mod wikipedia;
pub mod yahoo;
