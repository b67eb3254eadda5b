//! # Row Queries
//!
//! Reconstructs rows of an ingested dataset from its column files given a set
//! of cell ids. This is the path used by the point-cloud join (three axis
//! columns) and by ad-hoc `query` lookups.
//!
//! ```rust,no_run
//! use isomesh::query::ColumnarReader;
//! use isomesh::store::CacheLayout;
//!
//! let dataset = CacheLayout::new("cache").dataset("cells");
//! let mut reader = ColumnarReader::open(&dataset, &["X", "Y", "Z"])?;
//! for row in reader.read_rows(&[4, 0, 2])? {
//!     println!("{}: {:?}", row.cell_id, row.values);
//! }
//! # Ok::<(), isomesh::query::QueryError>(())
//! ```

mod error;
mod reader;


pub use error::QueryError;
pub use reader::{ColumnarReader, FullCell};
