pub mod sort;
pub mod sparse_vec;

pub use sparse_vec::SparseVec;
