pub mod balance;
pub mod login;
pub mod orders;
pub mod register;
pub mod withdraw;
pub mod withdrawals;
