//! Turns uploaded delimited files into cluster-assignment batches and submits
//! them to the gateway's create-cluster route.

pub mod assignment;
pub mod client;
pub mod errors;
pub mod pipeline;

pub use assignment::{ClusterAssignment, ClusterValue};
pub use client::{ClusterSubmitter, GatewayClient, SubmitResult};
pub use errors::UploadError;
pub use pipeline::{FileHandle, FilePicker, PathPicker, UploadPipeline};
