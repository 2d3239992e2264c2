//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod aws_secrets_manager_store;
mod mongo_principal_session;

pub use aws_secrets_manager_store::AwsSecretsManagerStore;
pub use mongo_principal_session::{
    MongoPrincipalSession, MongoPrincipalSessionConnector, MongoSessionSettings,
};
