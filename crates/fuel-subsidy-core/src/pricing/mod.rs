pub mod formula;
pub mod price_table;
