pub mod shop_parser;

pub use shop_parser::{Parser, ShopParser};
