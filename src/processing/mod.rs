//! The transform engine.
//!
//! Turns the raw order table into the expanded label table:
//!
//! - [`normalize`]: one function per derived/rewritten column
//! - [`derive()`]: adds `PRODUTO`, `DESCRICAO`, `PROD_DESC`, `IMAGEM_MODELO_NEW`, formats
//!   `PRECO_UNIT_PDV` and `LARGURA`, and projects the 14 output columns
//! - [`expand_by_quantity()`]: repeats each row `QTD` times
//! - [`transform()`]: both steps in one call

pub mod normalize;
pub mod transform;

pub use transform::{
    derive, expand_by_quantity, transform, TransformOptions, DEFAULT_IMAGE_PATH_PREFIX,
};
