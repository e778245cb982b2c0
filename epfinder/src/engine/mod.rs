pub mod qvector;
pub mod reco;
pub mod sink;
