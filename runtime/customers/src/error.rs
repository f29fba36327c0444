use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    #[error("Customer {0} not found")]
    NotFound(i64),

    #[error("RPC error: {0}")]
    Rpc(#[from] courier_fabric::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
