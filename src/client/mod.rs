pub mod dataplane;

pub use dataplane::{
    ApiInfo, ApplyParams, ClientError, ConfigurationClient, DataplaneClient, ParentQuery,
    ResourceId, ResourceTarget, Transaction,
};
