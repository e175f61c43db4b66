//! Configuration access port trait.

use rust_decimal::Decimal;
use std::str::FromStr;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// Exact decimal value; `default` when the key is absent or not a number.
    fn get_decimal(&self, section: &str, key: &str, default: Decimal) -> Decimal {
        self.get_string(section, key)
            .and_then(|v| Decimal::from_str(v.trim()).ok())
            .unwrap_or(default)
    }
}
