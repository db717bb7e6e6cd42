// Domain module: allocation models, derivations and the solver contract

pub mod deriver;
pub mod models;
pub mod solver_service;
pub mod value_objects;

pub use deriver::*;
pub use models::*;
pub use solver_service::*;
pub use value_objects::*;
