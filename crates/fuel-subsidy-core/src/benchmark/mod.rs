pub mod us_retail;
