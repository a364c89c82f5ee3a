pub mod caida;

pub use caida::CaidaCollector;
