pub mod reference_month;
