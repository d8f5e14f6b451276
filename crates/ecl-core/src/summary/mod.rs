//! Summary header (SMSPEC) model: vector classification, the column index and
//! per-step data rows.

mod data;
mod natural_cmp;
mod node;
mod smspec;
mod var_type;

pub use data::{SummaryData, SummaryStep};
pub use natural_cmp::natural_cmp;
pub use node::{
    DUMMY_WELL, GridDims, LgrLocation, PARAMS_GLOBAL_DEFAULT, SummaryNode, SummaryNodeBuilder,
};
pub use smspec::{CompletionKey, DateIndices, SummarySpec};
pub use var_type::{VarType, classify};
