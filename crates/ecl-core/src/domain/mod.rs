pub mod errors;

pub use errors::{
    EclError, EclErrorCategory, EclResult, ErrorLocation, ParserResult, ScheduleResult,
    SummaryResult,
};
