pub mod etl;
pub mod normalize;
pub mod pipeline;
pub mod serialize;

pub use crate::domain::model::{DatasetCollection, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
