pub mod config;
pub mod entities;
pub mod error;

pub use entities::{
    CodaColumn, CodaControl, CodaDoc, CodaFormula, CodaPage, CodaRow, CodaTable, CodaUser,
    ListResponse, MutationStatus, PageRef, RowsInserted,
};
pub use error::CodaError;
