pub mod activation;
pub mod error;
pub mod loss;
pub mod ops;
pub mod row_vector;
