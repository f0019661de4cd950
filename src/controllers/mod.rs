pub mod health;
pub mod intent;
pub mod proxy;
