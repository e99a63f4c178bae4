pub mod date;
pub mod money;

pub use date::ReceiptDate;
pub use money::Amount;
