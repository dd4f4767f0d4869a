pub mod payone;
